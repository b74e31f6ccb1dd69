use std::io::IsTerminal;
use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use pacer::args::PacerArgs;
use pacer::config::{apply_config, build_run_config, load_config};
use pacer::error::{AppResult, ValidationError};
use pacer::http::{Dispatcher, ReqwestTransport, TransportSettings};
use pacer::shutdown::shutdown_channel;
use pacer::ui::{LogProgress, ProgressReporter, TerminalProgress, print_banner, print_summary};

use crate::system::shutdown_handlers::setup_signal_shutdown_handler;

pub(crate) fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;

    let loaded = load_config(args.config.as_deref())?;
    if let Some(loaded) = loaded.as_ref() {
        apply_config(&mut args, &matches, &loaded.file)?;
    }

    crate::system::logger::init_logging(args.verbose, args.no_color);
    if let Some(loaded) = loaded.as_ref() {
        tracing::debug!("Using config file {}", loaded.path.display());
    }

    let config = build_run_config(&args)?;
    let transport = ReqwestTransport::new(TransportSettings::from(&args))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| ValidationError::RuntimeBuildFailed { source: err })?;

    print_banner(config.url().as_str(), config.duration_secs(), args.output_format);

    let summary = runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

        let finished = Dispatcher::new(Arc::new(transport))
            .with_reporter(select_reporter(&args))
            .with_shutdown(shutdown_rx)
            .run(&config)
            .await;

        // Release the signal task so the runtime can shut down.
        drop(shutdown_tx.send(()));
        if let Err(err) = signal_handle.await {
            tracing::debug!("Signal handler ended abnormally: {}", err);
        }
        finished
    });

    print_summary(&summary, args.output_format, args.no_color)
}

fn parse_args() -> AppResult<(PacerArgs, ArgMatches)> {
    let matches = PacerArgs::command().get_matches();
    let args = PacerArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

fn select_reporter(args: &PacerArgs) -> Arc<dyn ProgressReporter> {
    if !args.no_progress && std::io::stderr().is_terminal() {
        Arc::new(TerminalProgress::new(args.no_color))
    } else {
        Arc::new(LogProgress)
    }
}
