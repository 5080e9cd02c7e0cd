use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use colored::Colorize;
use pokerlab::Utility;
use pokerlab::cfr::options::Options;
use pokerlab::cfr::plus::CfrPlus;
use pokerlab::cfr::vanilla::VanillaCfr;
use pokerlab::error::Error;
use pokerlab::evaluation::exploitability::Exploitability;
use pokerlab::evaluation::value::GameValue;
use pokerlab::game::game::Game;
use pokerlab::portfolio::builder::PortfolioOptions;
use pokerlab::portfolio::builder::build_portfolio;
use pokerlab::response::best::BestResponse;
use pokerlab::sampling::log::MatchLog;
use pokerlab::save::manifest::Manifest;
use pokerlab::tree::builder::Builder;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pokerlab", about = "equilibrium, response, and portfolio strategies for small limit poker games", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// train a strategy with cfr+ (two players) or sampled cfr
    Train {
        game: PathBuf,
        iterations: usize,
        out: PathBuf,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = pokerlab::WEIGHT_DELAY)]
        weight_delay: usize,
        #[arg(long)]
        checkpoints: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        minimal_probability: f64,
    },
    /// compute the exact best response to a strategy
    BestResponse {
        game: PathBuf,
        strategy: PathBuf,
        out: PathBuf,
    },
    /// seat-averaged utility of two strategies against each other
    Evaluate {
        game: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    /// how much a best responder wins against a strategy, mbb/g
    Exploitability { game: PathBuf, strategy: PathBuf },
    /// build per-player observation files from a match log
    Sample {
        game: PathBuf,
        log: PathBuf,
        out_dir: PathBuf,
    },
    /// train and select a portfolio of responses to weak opponents
    BuildPortfolio {
        game: PathBuf,
        opponents: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        size: Option<usize>,
        #[arg(long, default_value_t = 0.05)]
        threshold: f64,
        #[arg(long, default_value_t = 1500)]
        iterations: usize,
        #[arg(long, default_value_t = pokerlab::WEIGHT_DELAY)]
        weight_delay: usize,
        #[arg(long, default_value_t = 100)]
        checkpoints: usize,
        #[arg(long, default_value_t = 100.0)]
        target: Utility,
        #[arg(long, default_value_t = 50.0)]
        delta: Utility,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() {
    pokerlab::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            error.print().ok();
            std::process::exit(if error.use_stderr() { 1 } else { 0 });
        }
    };
    match run(cli) {
        Ok(()) => {}
        Err(error) => {
            log::error!("{:#}", error);
            std::process::exit(exit_code(&error));
        }
    }
}

/// 1 for usage and parameter errors, 2 for io, 3 for games the
/// library cannot handle
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<Error>() {
        Some(Error::UnsupportedGame(_)) => 3,
        Some(Error::Io(_)) => 2,
        Some(_) => 1,
        None => match error.downcast_ref::<std::io::Error>() {
            Some(_) => 2,
            None => 1,
        },
    }
}

fn load_game(path: &PathBuf) -> anyhow::Result<Game> {
    let text = std::fs::read_to_string(path)
        .map_err(Error::from)
        .with_context(|| format!("reading game definition {}", path.display()))?;
    Ok(text.parse::<Game>()?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Train {
            game,
            iterations,
            out,
            seed,
            weight_delay,
            checkpoints,
            minimal_probability,
        } => {
            let game = load_game(&game)?;
            let comment = format!("training iterations: {}", iterations);
            if game.players() == 2 {
                let mut options = Options::new(iterations)
                    .with_weight_delay(weight_delay)
                    .with_minimal_action_probability(minimal_probability);
                if let Some(checkpoints) = checkpoints {
                    options = options.with_checkpoints(checkpoints);
                }
                let mut solver = CfrPlus::new(&game, seed)?;
                let strategy = solver.train(&options, |_, index, iterations| {
                    log::info!("checkpoint {} after {} iterations", index, iterations);
                })?;
                pokerlab::save::strategy::write(solver.tree(), &strategy, &out, &[comment])?;
            } else {
                let mut solver = VanillaCfr::new(&game, seed)?;
                let strategy = solver.train(iterations)?;
                pokerlab::save::strategy::write(solver.tree(), &strategy, &out, &[comment])?;
            }
            log::info!("strategy written to {}", out.display());
            Ok(())
        }
        Command::BestResponse {
            game,
            strategy,
            out,
        } => {
            let game = load_game(&game)?;
            let solver = BestResponse::new(&game)?;
            let fixed = pokerlab::save::strategy::read(solver.tree(), &strategy)
                .with_context(|| format!("reading strategy {}", strategy.display()))?;
            let response = solver.solve(&fixed)?;
            let comment = format!("best response to {}", strategy.display());
            pokerlab::save::strategy::write(solver.tree(), &response, &out, &[comment])?;
            log::info!("best response written to {}", out.display());
            Ok(())
        }
        Command::Evaluate {
            game,
            first,
            second,
        } => {
            let game = load_game(&game)?;
            let value = GameValue::new(&game)?;
            let left = pokerlab::save::strategy::read(value.tree(), &first)
                .with_context(|| format!("reading strategy {}", first.display()))?;
            let right = pokerlab::save::strategy::read(value.tree(), &second)
                .with_context(|| format!("reading strategy {}", second.display()))?;
            let utilities = value.evaluate(&[&left, &right])?;
            for (path, utility) in [&first, &second].iter().zip(utilities.iter()) {
                let rendered = format!("{:+.6}", utility);
                let rendered = if *utility >= 0.0 {
                    rendered.green()
                } else {
                    rendered.red()
                };
                println!("{}  {}", rendered, path.display());
            }
            Ok(())
        }
        Command::Exploitability { game, strategy } => {
            let game = load_game(&game)?;
            let exploitability = Exploitability::new(&game)?;
            let fixed = pokerlab::save::strategy::read(exploitability.tree(), &strategy)
                .with_context(|| format!("reading strategy {}", strategy.display()))?;
            let measured = exploitability.exploitability(&fixed)?;
            println!("{:.6} mbb/g", measured);
            Ok(())
        }
        Command::Sample { game, log, out_dir } => {
            let game = load_game(&game)?;
            let tree = Builder::build(&game)?;
            let parsed = MatchLog::read(&game, &log)
                .with_context(|| format!("reading match log {}", log.display()))?;
            let samples = pokerlab::sampling::log::sample(&game, &tree, &parsed)?;
            let comment = format!("sampled from {}", log.display());
            let mut names = samples.keys().cloned().collect::<Vec<_>>();
            names.sort();
            for name in &names {
                let out = out_dir.join(format!("{}.samples", name));
                pokerlab::save::samples::write(&tree, &samples[name], &out, &[comment.clone()])?;
                log::info!("observations for {} written to {}", name, out.display());
            }
            let (table, players) = parsed.utility_table()?;
            for (column, player) in players.iter().enumerate() {
                let mean = table.iter().map(|row| row[column]).sum::<Utility>()
                    / table.len().max(1) as Utility;
                println!("{}: {:+.4} chips per hand", player, mean);
            }
            Ok(())
        }
        Command::BuildPortfolio {
            game,
            opponents,
            out,
            size,
            threshold,
            iterations,
            weight_delay,
            checkpoints,
            target,
            delta,
            seed,
        } => {
            let game = load_game(&game)?;
            let tree = Builder::build(&game)?;
            let fixed = opponents
                .iter()
                .map(|path| {
                    pokerlab::save::strategy::read(&tree, path)
                        .with_context(|| format!("reading strategy {}", path.display()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let mut options = PortfolioOptions::new(
                Options::new(iterations)
                    .with_weight_delay(weight_delay)
                    .with_checkpoints(checkpoints),
            );
            options.size = size;
            options.threshold = threshold;
            let targets = vec![(target, delta); fixed.len()];
            let portfolio = build_portfolio(&game, &fixed, &targets, &options, seed)?;
            let mut responses = Vec::new();
            for (position, response) in portfolio.responses.iter().enumerate() {
                let name = format!("response-{}.strategy", position);
                let comment = format!(
                    "response to {}",
                    opponents[portfolio.selected[position]].display()
                );
                pokerlab::save::strategy::write(
                    &tree,
                    response,
                    &out.join(&name),
                    &[comment],
                )?;
                responses.push(name);
            }
            let manifest = Manifest {
                game: game.to_string(),
                opponents: opponents
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect(),
                responses,
                selected: portfolio.selected.clone(),
                utilities: portfolio.utilities.clone(),
            };
            pokerlab::save::manifest::write(&manifest, &out.join("portfolio.json"))?;
            log::info!(
                "portfolio of {} responses written to {}",
                portfolio.responses.len(),
                out.display()
            );
            Ok(())
        }
    }
}
