pub mod app;
pub mod shared;
pub mod shell;
pub mod todo;

use app::logging;
use app::settings::load_settings;
use shared::paths::get_storage_dir;
use todo::coordinator::TodoCoordinator;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging first (before any other initialization)
    let _logging_guards = logging::init_logging()?;

    let settings = load_settings();
    let data_dir = get_storage_dir();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let controller = todo::open_task_list(&data_dir, &settings);
        let (coordinator, handle) = TodoCoordinator::new(controller);
        let coordinator_task = tokio::spawn(coordinator.run());

        println!("{}", shell::HELP);
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        shell::run_shell(&handle, stdin, &mut stdout).await?;

        // Dropping the last handle lets the coordinator finish any pending add
        drop(handle);
        let controller = coordinator_task.await?;

        tracing::info!(
            target: "system",
            count = controller.tasks().len(),
            "Shutting down"
        );
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
