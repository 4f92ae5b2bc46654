use async_trait::async_trait;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use runlist::core::utils::load_commands;
use runlist::modules::shell::ShellTask;
use runlist::runner::handler;
use runlist::{Chain, Context, List, Task, TaskError, TaskResult};
use std::io;
use std::process::ExitCode;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// runlist - run shell commands concurrently or as a fail-fast chain
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable verbose output
    #[clap(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every command at once
    List(RunArgs),
    /// Run commands in order, stopping at the first failure
    Chain(RunArgs),
}

/// Arguments shared by both runners
#[derive(Parser, Debug)]
struct RunArgs {
    /// Commands to run
    commands: Vec<String>,
    /// File with one command per line
    #[clap(short, long)]
    file: Option<String>,
    /// Cancel commands still running after this many seconds
    #[clap(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = env_filter(
        args.verbose,
        &std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default(),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), TaskError> {
    let root = Context::background();
    let interrupt = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling commands");
            interrupt.cancel();
        }
    });

    match command {
        Commands::List(run_args) => {
            let (ctx, commands) = prepare(&root, run_args).await?;
            let total = commands.len();
            let failed = run_list(&ctx, commands).await;
            if failed > 0 {
                return Err(format!("{} of {} commands failed", failed, total).into());
            }
            info!(total, "all commands succeeded");
        }
        Commands::Chain(run_args) => {
            let (ctx, commands) = prepare(&root, run_args).await?;
            let total = commands.len();
            let mut chain: Chain = commands.into_iter().map(ShellTask::new).collect();
            chain.run(&ctx).await?;
            info!(total, "chain completed");
        }
    }
    Ok(())
}

/// Directives from `directives` (the `RUST_LOG` value) take precedence; the
/// verbosity flag only picks the level used when there are none.
fn env_filter(verbose: bool, directives: &str) -> EnvFilter {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(directives)
}

async fn prepare(root: &Context, args: RunArgs) -> Result<(Context, Vec<String>), TaskError> {
    let RunArgs {
        mut commands,
        file,
        timeout,
    } = args;

    if let Some(path) = file {
        commands.extend(load_commands(&path).await?);
    }
    if commands.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "no commands given").into());
    }

    let ctx = match timeout {
        Some(secs) => {
            debug!(secs, "using timeout");
            root.with_timeout(Duration::from_secs(secs))
        }
        None => root.with_cancel(),
    };
    Ok((ctx, commands))
}

/// Run `commands` as a [`List`] and wait until every spawned command is gone.
/// Returns the number of failures.
async fn run_list(ctx: &Context, commands: Vec<String>) -> usize {
    let progress = ProgressBar::new(commands.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    let failures = Arc::new(AtomicUsize::new(0));
    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);

    let mut list = List::new();
    for command in commands {
        let shell = ShellTask::new(command);
        let report = handler::log(shell.command());
        let task = TrackedTask {
            inner: shell,
            progress: progress.clone(),
            _done: done_tx.clone(),
        };
        let failures = Arc::clone(&failures);
        let progress = progress.clone();
        list.add(task, move |err| {
            failures.fetch_add(1, Ordering::Relaxed);
            progress.suspend(move || report(err));
        });
    }
    drop(done_tx);

    list.run(ctx);

    // Each tracked task owns a sender, so the channel closes once all of them are dropped.
    let _ = done_rx.recv().await;
    progress.finish_and_clear();
    failures.load(Ordering::Relaxed)
}

struct TrackedTask<T: Task> {
    inner: T,
    progress: ProgressBar,
    _done: mpsc::Sender<()>,
}

#[async_trait]
impl<T> Task for TrackedTask<T>
where
    T: Task,
{
    async fn run(&self, ctx: Context) -> TaskResult {
        let result = self.inner.run(ctx).await;
        self.progress.inc(1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn emitted(filter: EnvFilter) -> String {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            debug!("debug line");
            info!("info line");
        });
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn defaults_to_info() {
        let output = emitted(env_filter(false, ""));
        assert!(output.contains("info line"), "{output}");
        assert!(!output.contains("debug line"), "{output}");
    }

    #[test]
    fn verbose_defaults_to_debug() {
        let output = emitted(env_filter(true, ""));
        assert!(output.contains("debug line"), "{output}");
    }

    #[test]
    fn rust_log_directives_win() {
        let output = emitted(env_filter(false, "runlist=debug"));
        assert!(output.contains("debug line"), "{output}");

        let output = emitted(env_filter(true, "runlist=warn"));
        assert!(!output.contains("info line"), "{output}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn list_failures_are_counted() {
        let commands = vec!["exit 2".to_string(), "true".to_string()];
        let failed = run_list(&Context::background(), commands).await;
        assert_eq!(failed, 1);
    }
}
