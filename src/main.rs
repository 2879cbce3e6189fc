fn main() {
    if let Err(e) = nexus_todo_lib::run() {
        eprintln!("nexus-todo: {}", e);
        std::process::exit(1);
    }
}
