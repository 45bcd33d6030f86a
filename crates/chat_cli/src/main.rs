use std::future;
use std::io::{self, Write};
use std::sync::atomic::Ordering;

use chat_cli::app::App;
use chat_cli::config::CliConfig;
use chat_cli::logging::{init_logging, level_from_env};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    if let Err(error) = init_logging(level_from_env()) {
        eprintln!("logging disabled: {error}");
    }

    let config = CliConfig::from_env().map_err(io::Error::other)?;
    let mut app = App::from_config(&config).map_err(io::Error::other)?;
    let cancellation = app.cancellation();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.print_transcript(&mut out)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !app.should_exit {
        write!(out, "> ")?;
        out.flush()?;

        // Ctrl-C at the prompt exits; while a reply streams it cancels it.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.store(true, Ordering::SeqCst);
            }
            future::pending::<()>().await
        };
        tokio::select! {
            result = app.handle_line(&line, &mut out) => result?,
            _ = interrupt => {}
        }
    }

    Ok(())
}
