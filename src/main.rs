use std::{env, process::ExitCode};
use tracing::info;
use vocab_web::{logging, Catalog, Config, Server, StartupError, Vocabulary};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = Config::from_args(env::args_os())?;
    let vocab =
        Vocabulary::load(&config.vocab_path).map_err(|source| StartupError::Vocabulary {
            path: config.vocab_path.clone(),
            source,
        })?;
    logging::init(config.log_dir.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let addr = config.addr();
        let catalog = Catalog::new(vocab);
        let vocab_bytes = catalog.vocabulary().as_bytes().len();
        let resources = catalog.resource_names().count();

        let server = Server::builder().bind(addr)?.resolver(catalog).build();
        info!(%addr, vocab_bytes, resources, "server listening");

        server.launch().await;
        Ok::<_, StartupError>(())
    })
}
