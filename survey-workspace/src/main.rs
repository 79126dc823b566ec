use survey_workspace::engine::core::app_setup::create_app;
use survey_workspace::engine::core::config::WorkspaceConfig;

fn main() {
    // The log subscriber is not up until the app is built, so config trouble goes to stderr.
    let config = WorkspaceConfig::load().unwrap_or_else(|error| {
        eprintln!("Falling back to default workspace config: {error}");
        WorkspaceConfig::default()
    });

    let mut app = match create_app(config) {
        Ok(app) => app,
        Err(error) => {
            eprintln!("Cannot start survey workspace: {error}");
            std::process::exit(1);
        }
    };

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}
