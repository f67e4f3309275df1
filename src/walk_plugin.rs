use bevy::{
    input::{keyboard::KeyboardInput, ButtonState},
    prelude::*,
};

use crate::walk::{Position, StepEvent, WalkSearch, WalkSnapshot};

use self::{components::*, events::SearchTick, resources::StepTimerResource};

use self::{events::WalkFinishedEvent, resources::DrawConfigurationResource};

// Grid lines sit under the path, segments under their spots,
// the rejected-probe marker on top of everything
const GRID_Z: f32 = 0.;
const SEGMENT_Z: f32 = 1.;
const SPOT_Z: f32 = 2.;
const PROBE_Z: f32 = 3.;

const BG_COLOR: Color = Color::WHITE;
const GRID_COLOR: Color = Color::rgb(0.78, 0.78, 0.78);
const PATH_COLOR: Color = Color::rgb(0.2, 0.39, 0.98);
const PROBE_COLOR: Color = Color::rgb(0.78, 0.39, 0.39);

pub struct WalkPlugin {
    pub rect: UiRect<f32>,
    pub rows: usize,
    pub cols: usize,
    pub step_seconds: f32,
}

impl Plugin for WalkPlugin {
    fn build(&self, app: &mut App) {
        let search = WalkSearch::new(self.rows, self.cols).unwrap();

        let (grid_cols, grid_rows) = search.dimension();

        let cell_width = (self.rect.right - self.rect.left) / grid_cols as f32;
        let cell_height = (self.rect.top - self.rect.bottom) / grid_rows as f32;
        let cell_size = cell_height.min(cell_width);

        let snapshot = search.snapshot();

        app.insert_resource(ClearColor(BG_COLOR))
            .insert_resource(snapshot)
            .insert_resource(search)
            .insert_resource(DrawConfigurationResource {
                cell_size,
                half_cell: cell_size / 2.,
                origin: (self.rect.left, self.rect.bottom),
                grid_cols,
                grid_rows,
            })
            .insert_resource(StepTimerResource(Timer::from_seconds(
                self.step_seconds,
                true,
            )))
            .add_event::<SearchTick>()
            .add_event::<WalkFinishedEvent>()
            .add_startup_system(draw_grid)
            .add_system(search_tick)
            .add_system(control)
            .add_system(advance.label("advance"))
            .add_system(update_spots.after("advance"))
            .add_system(update_segments.after("advance"))
            .add_system(update_probe.after("advance"))
            .add_system(finished.after("advance"));
    }
}

fn search_tick(
    time: Res<Time>,
    mut step_timer: ResMut<StepTimerResource>,
    mut tick_event_writer: EventWriter<SearchTick>,
) {
    let step_timer = &mut step_timer.0;
    if !step_timer.tick(time.delta()).finished() {
        return;
    }

    debug!("tick!");

    tick_event_writer.send(SearchTick);
}

fn advance(
    mut tick_event: EventReader<SearchTick>,
    mut search: ResMut<WalkSearch>,
    mut snapshot: ResMut<WalkSnapshot>,
    mut finished_event_writer: EventWriter<WalkFinishedEvent>,
) {
    if tick_event.iter().count() == 0 {
        return;
    }

    if search.finished() {
        return;
    }

    let event = search.step();
    *snapshot = search.snapshot();

    if let StepEvent::Finished(state) = event {
        finished_event_writer.send(WalkFinishedEvent { state });
    }
}

// Space pauses a running search and restarts a paused or finished one
fn control(
    mut keyboard_input_events: EventReader<KeyboardInput>,
    mut step_timer: ResMut<StepTimerResource>,
    mut search: ResMut<WalkSearch>,
    mut snapshot: ResMut<WalkSnapshot>,
) {
    let space_pressed = keyboard_input_events
        .iter()
        .filter(|ki| ki.state == ButtonState::Pressed)
        .filter_map(|ki| ki.key_code)
        .any(|kc| kc == KeyCode::Space);

    if !space_pressed {
        return;
    }

    let step_timer = &mut step_timer.0;
    if search.finished() || step_timer.paused() {
        search.reset();
        *snapshot = search.snapshot();
        step_timer.unpause();
    } else {
        info!("walk paused");
        step_timer.pause();
    }
}

fn finished(
    mut finished_event_reader: EventReader<WalkFinishedEvent>,
    mut step_timer: ResMut<StepTimerResource>,
) {
    if finished_event_reader.iter().count() == 0 {
        return;
    }

    step_timer.0.pause();
}

fn update_spots(
    mut commands: Commands,
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<WalkSnapshot>,
    mut spot_query: Query<(Entity, &mut Transform), With<SpotComponent>>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let mut spots = spot_query.iter_mut();
    for position in snapshot.path.iter() {
        match spots.next() {
            Some(mut e) => {
                move_to(&mut e.1, position, &draw_configuration);
            }
            None => {
                spawn_spot(&mut commands, position, &draw_configuration);
            }
        }
    }

    // Cells dropped by backtracking or a restart leave stale spots behind
    spots.for_each(|p| {
        commands.entity(p.0).despawn();
    });
}

fn update_segments(
    mut commands: Commands,
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<WalkSnapshot>,
    mut segment_query: Query<(Entity, &mut Transform, &mut Sprite), With<SegmentComponent>>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let mut segments = segment_query.iter_mut();
    for pair in snapshot.path.windows(2) {
        match segments.next() {
            Some((_, mut transform, mut sprite)) => {
                place_segment(&mut transform, &mut sprite, &pair[0], &pair[1], &draw_configuration);
            }
            None => {
                spawn_segment(&mut commands, &pair[0], &pair[1], &draw_configuration);
            }
        }
    }

    segments.for_each(|s| {
        commands.entity(s.0).despawn();
    });
}

fn update_probe(
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<WalkSnapshot>,
    mut probe_query: Query<(&mut Transform, &mut Visibility), With<ProbeComponent>>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let (mut transform, mut visibility) = match probe_query.iter_mut().next() {
        Some(probe) => probe,
        None => return,
    };

    match snapshot.rejected {
        Some((from, direction)) => {
            let (cx, cy) = center_of(&from, &draw_configuration);
            let (dx, dy) = direction.delta();
            // grid rows grow downwards, screen y grows upwards
            transform.translation.x = cx + dx as f32 * draw_configuration.cell_size;
            transform.translation.y = cy - dy as f32 * draw_configuration.cell_size;
            transform.translation.z = PROBE_Z;
            visibility.is_visible = true;
        }
        None => {
            visibility.is_visible = false;
        }
    }
}

fn draw_grid(mut commands: Commands, draw_configuration: Res<DrawConfigurationResource>) {
    let width = draw_configuration.grid_cols as f32 * draw_configuration.cell_size;
    let height = draw_configuration.grid_rows as f32 * draw_configuration.cell_size;
    let center_x = draw_configuration.origin.0 + width / 2.;
    let center_y = draw_configuration.origin.1 + height / 2.;

    for r in 1..draw_configuration.grid_rows {
        commands.spawn_bundle(SpriteBundle {
            sprite: Sprite {
                color: GRID_COLOR,
                custom_size: Some(Vec2::new(width, 1.)),
                ..default()
            },
            transform: Transform::from_xyz(
                center_x,
                draw_configuration.origin.1 + r as f32 * draw_configuration.cell_size,
                GRID_Z,
            ),
            ..default()
        });
    }

    for c in 1..draw_configuration.grid_cols {
        commands.spawn_bundle(SpriteBundle {
            sprite: Sprite {
                color: GRID_COLOR,
                custom_size: Some(Vec2::new(1., height)),
                ..default()
            },
            transform: Transform::from_xyz(
                draw_configuration.origin.0 + c as f32 * draw_configuration.cell_size,
                center_y,
                GRID_Z,
            ),
            ..default()
        });
    }

    // Marker revealed whenever the search bumps into an edge or the path
    commands
        .spawn_bundle(SpriteBundle {
            sprite: Sprite {
                color: PROBE_COLOR,
                custom_size: Some(Vec2::splat(draw_configuration.cell_size / 4.)),
                ..default()
            },
            visibility: Visibility { is_visible: false },
            ..default()
        })
        .insert(ProbeComponent);
}

fn spawn_spot(
    commands: &mut Commands,
    position: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    let mut bundle = SpriteBundle {
        sprite: Sprite {
            color: PATH_COLOR,
            custom_size: Some(Vec2::splat(draw_configuration.cell_size * 2. / 3.)),
            ..default()
        },
        ..default()
    };
    move_to(&mut bundle.transform, position, draw_configuration);
    bundle.transform.translation.z = SPOT_Z;

    commands.spawn_bundle(bundle).insert(SpotComponent);
}

fn spawn_segment(
    commands: &mut Commands,
    from: &Position,
    to: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    let mut bundle = SpriteBundle {
        sprite: Sprite {
            color: PATH_COLOR,
            ..default()
        },
        ..default()
    };
    place_segment(
        &mut bundle.transform,
        &mut bundle.sprite,
        from,
        to,
        draw_configuration,
    );

    commands.spawn_bundle(bundle).insert(SegmentComponent);
}

fn place_segment(
    transform: &mut Transform,
    sprite: &mut Sprite,
    from: &Position,
    to: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    let (ax, ay) = center_of(from, draw_configuration);
    let (bx, by) = center_of(to, draw_configuration);

    transform.translation.x = (ax + bx) / 2.;
    transform.translation.y = (ay + by) / 2.;
    transform.translation.z = SEGMENT_Z;

    let thickness = draw_configuration.cell_size / 8.;
    sprite.custom_size = Some(if from.y == to.y {
        Vec2::new(draw_configuration.cell_size, thickness)
    } else {
        Vec2::new(thickness, draw_configuration.cell_size)
    });
}

fn move_to(
    transform: &mut Transform,
    to: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    let (x, y) = center_of(to, draw_configuration);
    transform.translation.x = x;
    transform.translation.y = y;
}

fn center_of(position: &Position, draw_configuration: &DrawConfigurationResource) -> (f32, f32) {
    let row_from_bottom = (draw_configuration.grid_rows - 1 - position.y) as f32;
    (
        position.x as f32 * draw_configuration.cell_size
            + draw_configuration.origin.0
            + draw_configuration.half_cell,
        row_from_bottom * draw_configuration.cell_size
            + draw_configuration.origin.1
            + draw_configuration.half_cell,
    )
}

pub mod resources {
    use bevy::time::Timer;

    #[derive(Clone)]
    pub struct DrawConfigurationResource {
        pub cell_size: f32,
        pub half_cell: f32,
        pub origin: (f32, f32),
        pub grid_cols: usize,
        pub grid_rows: usize,
    }

    pub struct StepTimerResource(pub Timer);
}

pub mod events {
    use crate::walk::SearchState;

    pub struct SearchTick;

    pub struct WalkFinishedEvent {
        pub state: SearchState,
    }
}

mod components {
    use bevy::prelude::Component;

    #[derive(Component)]
    pub struct SpotComponent;

    #[derive(Component)]
    pub struct SegmentComponent;

    #[derive(Component)]
    pub struct ProbeComponent;
}
