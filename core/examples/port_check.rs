//! Example: Check a port and show who holds it.
//!
//! Usage: cargo run --example port_check -- 8000

use portguard_core::{PortManager, DEFAULT_HOST};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let port: u16 = match std::env::args().nth(1).map(|arg| arg.parse()) {
        Some(Ok(port)) => port,
        _ => 8000,
    };

    let manager = PortManager::system();

    if manager.check_port_available(DEFAULT_HOST, port) {
        println!("Port {} is available", port);
        return;
    }

    println!("Port {} is in use", port);
    for process in manager.get_processes_using_port(port).await {
        println!("  {} [{}] {}", process, process.process_type(), process.command);
    }

    match manager.find_available_port(DEFAULT_HOST, port, 100) {
        Ok(free) => println!("Next free port: {}", free),
        Err(e) => eprintln!("Error: {}", e),
    }
}
