use bevy::prelude::*;
use walk::{SearchState, WalkSearch, WalkSnapshot};
use walk_plugin::{events::WalkFinishedEvent, WalkPlugin};

mod configuration;
pub mod walk;
mod walk_plugin;

pub struct MainPlugin;
impl Plugin for MainPlugin {
    fn build(&self, app: &mut App) {
        let window_description = app.world.resource::<WindowDescriptor>();

        let padding = 5.;
        // calculate the region where the walk is drawn
        let top = window_description.height / 2. - padding;
        let bottom = -window_description.height / 2. + padding;
        let right = window_description.width / 2. - padding;
        let left = -window_description.width / 2. + padding;

        app.add_startup_system(setup)
            .add_system(update_title)
            .add_system(announce_finished)
            .add_plugin(WalkPlugin {
                rect: UiRect {
                    top,
                    left,
                    right,
                    bottom,
                },
                rows: configuration::GRID_ROWS,
                cols: configuration::GRID_COLS,
                step_seconds: configuration::STEP_SECONDS,
            });
    }
}

fn setup(mut commands: Commands) {
    let camera = Camera2dBundle::default();
    commands.spawn_bundle(camera);
}

// The visited count lives in the window title, the walk itself has the
// whole window to draw in.
fn update_title(
    mut windows: ResMut<Windows>,
    search: Res<WalkSearch>,
    snapshot: Res<WalkSnapshot>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let window = match windows.get_primary_mut() {
        Some(window) => window,
        None => return,
    };

    let total = search.cell_count();
    let title = match snapshot.state {
        SearchState::Found => format!("Self-Avoiding Walk - every cell visited ({})", total),
        SearchState::Exhausted => "Self-Avoiding Walk - exhausted, press Space".to_string(),
        _ => format!("Self-Avoiding Walk - {}/{}", snapshot.path.len(), total),
    };
    window.set_title(title);
}

fn announce_finished(mut finished_event_reader: EventReader<WalkFinishedEvent>) {
    for event in finished_event_reader.iter() {
        match event.state {
            SearchState::Found => info!("found a walk covering every cell"),
            SearchState::Exhausted => warn!("search exhausted without covering the grid"),
            _ => {}
        }
    }
}
