use dom_relay::{
    app::{App, bootstrap},
    commands::{Command, answer},
    config::{Config, global_config},
    dom::MemoryDocument,
    telemetry::setup_logger,
};
use dotenv::dotenv;
use std::{cell::RefCell, rc::Rc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, stdin, stdout};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    Config::from_env().init()?;
    let config = global_config();
    setup_logger(&config.log)?;

    let mut doc = MemoryDocument::loading_page();
    let app = Rc::new(RefCell::new(App::new()));
    let boot = bootstrap(&mut doc, &app);
    doc.finish_loading();
    info!(?boot, "page ready");

    let mut out = stdout();
    out.write_all(b"type `help` for a list of commands\n").await?;

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        out.write_all(config.prompt.as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(cmd) => answer(&mut doc, cmd),
            Err(err) => {
                debug!(%err, line = %line, "rejected command");
                format!("error: {err}")
            }
        };
        out.write_all(reply.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }

    app.borrow_mut().teardown(&mut doc);
    info!("shell closed");
    Ok(())
}
