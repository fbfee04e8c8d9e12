//! Example: Serve on the desired port, or the next free one.
//!
//! Start it twice; the second copy moves to another port and reports who
//! holds the first one.

use portguard_core::serve_with_port_handling;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let result = serve_with_port_handling("127.0.0.1", 8000, "echo", |listener| async move {
        match listener.local_addr() {
            Ok(addr) => println!("Echo server listening on {}", addr),
            Err(e) => eprintln!("Error: {}", e),
        }

        loop {
            let (mut socket, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    eprintln!("Accept failed: {}", e);
                    continue;
                }
            };

            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 || socket.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
                println!("{} disconnected", peer);
            });
        }
    })
    .await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }
}
