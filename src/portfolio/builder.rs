use crate::Utility;
use crate::cfr::options::Options;
use crate::cfr::strategy::Strategy;
use crate::error::Error;
use crate::error::Result;
use crate::evaluation::exploitability::Exploitability;
use crate::game::game::Game;
use crate::response::optimizer::RnrOptimizer;
use rayon::prelude::*;

/// knobs for portfolio construction. either a fixed size or a
/// positive cut threshold must be given; with a threshold the
/// greedy curve is cut where a step's gain drops below
/// `threshold * (final - initial)` of the whole curve.
#[derive(Debug, Clone)]
pub struct PortfolioOptions {
    pub size: Option<usize>,
    pub threshold: f64,
    pub training: Options,
}

impl PortfolioOptions {
    pub fn new(training: Options) -> Self {
        Self {
            size: None,
            threshold: 0.05,
            training,
        }
    }
}

/// the product of portfolio construction: the selected responses
/// in greedy order, which opponents they answer, and the full
/// exploitation matrix backing the selection.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub responses: Vec<Strategy>,
    pub selected: Vec<usize>,
    pub utilities: Vec<Vec<Utility>>,
}

/// train one restricted nash response per opponent in parallel,
/// score every response against every opponent, then greedily
/// keep the responses that lift the worst-case-free mean the most.
pub fn build_portfolio(
    game: &Game,
    opponents: &[Strategy],
    targets: &[(Utility, Utility)],
    options: &PortfolioOptions,
    seed: u64,
) -> Result<Portfolio> {
    if opponents.is_empty() {
        return Err(Error::ParameterOutOfRange(
            "no opponents to build a portfolio from".to_string(),
        ));
    }
    if targets.len() != opponents.len() {
        return Err(Error::ParameterOutOfRange(format!(
            "{} exploitability targets for {} opponents",
            targets.len(),
            opponents.len()
        )));
    }
    if options.size.unwrap_or(0) == 0 && options.threshold <= 0.0 {
        return Err(Error::ParameterOutOfRange(
            "either a portfolio size or a positive cut threshold is required".to_string(),
        ));
    }
    options.training.validate()?;
    let workers = std::cmp::max(num_cpus::get() / 2, 2);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|error| Error::Io(std::io::Error::other(error.to_string())))?;
    log::info!(
        "training {} responses across {} workers",
        opponents.len(),
        workers
    );
    let responses = pool.install(|| {
        opponents
            .par_iter()
            .zip(targets.par_iter())
            .enumerate()
            .map(|(index, (opponent, (target, delta)))| {
                let optimizer = RnrOptimizer::new(game, options.training.clone())?;
                let (response, measured, p) =
                    optimizer.train(opponent, *target, *delta, seed.wrapping_add(index as u64))?;
                log::info!(
                    "response {} reached {:.3} mbb/g at p = {:.4}",
                    index,
                    measured,
                    p
                );
                Ok(response)
            })
            .collect::<Result<Vec<_>>>()
    })?;
    let exploitability = Exploitability::new(game)?;
    let mut utilities = vec![vec![0.0; opponents.len()]; responses.len()];
    for (i, response) in responses.iter().enumerate() {
        for (j, opponent) in opponents.iter().enumerate() {
            utilities[i][j] = exploitability.response_utility(opponent, response)?;
        }
    }
    let selected = select(&utilities, options.size, options.threshold)?;
    let responses = selected
        .iter()
        .map(|&index| responses[index].clone())
        .collect();
    Ok(Portfolio {
        responses,
        selected,
        utilities,
    })
}

/// greedy selection over the exploitation matrix: seed with the
/// best average response, then repeatedly add whichever response
/// most improves the mean of per-opponent maxima.
pub fn select(
    utilities: &[Vec<Utility>],
    size: Option<usize>,
    threshold: f64,
) -> Result<Vec<usize>> {
    let candidates = utilities.len();
    if candidates == 0 {
        return Err(Error::ParameterOutOfRange(
            "empty exploitation matrix".to_string(),
        ));
    }
    let opponents = utilities[0].len();
    let mean = |row: &[Utility]| row.iter().sum::<Utility>() / opponents as Utility;
    let mut first = 0;
    for candidate in 1..candidates {
        if mean(&utilities[candidate]) > mean(&utilities[first]) {
            first = candidate;
        }
    }
    let mut order = vec![first];
    let mut curve = vec![mean(&utilities[first])];
    let mut ceiling = utilities[first].clone();
    let mut available = vec![true; candidates];
    available[first] = false;
    for _ in 1..candidates {
        let mut best: Option<(usize, Vec<Utility>, Utility)> = None;
        for candidate in 0..candidates {
            if !available[candidate] {
                continue;
            }
            let lifted = ceiling
                .iter()
                .zip(utilities[candidate].iter())
                .map(|(&held, &offered)| held.max(offered))
                .collect::<Vec<_>>();
            let value = mean(&lifted);
            if best.as_ref().is_none_or(|(_, _, top)| value > *top) {
                best = Some((candidate, lifted, value));
            }
        }
        let (candidate, lifted, value) = best.expect("candidates remain");
        available[candidate] = false;
        ceiling = lifted;
        order.push(candidate);
        curve.push(value);
    }
    let keep = match size {
        Some(size) if size > 0 => size.min(candidates),
        _ => {
            let total = curve[candidates - 1] - curve[0];
            let minimal = total * threshold;
            let mut keep = 1;
            for step in 1..candidates {
                if curve[step] - curve[step - 1] >= minimal {
                    keep += 1;
                } else {
                    break;
                }
            }
            keep
        }
    };
    order.truncate(keep);
    Ok(order)
}
