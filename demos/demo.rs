// demos/demo.rs
use parallel_mc::analytics::bs_analytic;
use parallel_mc::config::PricerConfig;
use parallel_mc::math_utils::Timer;
use parallel_mc::mc::contracts::{
    AsianOption, BarrierOption, ExchangeOption, Portfolio, VanillaOption,
};
use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
use parallel_mc::mc::payoffs::ContinuousTimeContract;
use parallel_mc::models::MultiAssetModel;
use parallel_mc::PricingResult;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // An optional TOML file overrides the default configuration
    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| PricerConfig::from_toml_str(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Could not load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PricerConfig::default().with_scenarios(200_000).with_steps(52),
    };

    if let Err(e) = run_demo(config) {
        eprintln!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn report<C: ContinuousTimeContract>(
    pricer: &ParallelMonteCarloPricer,
    model: &MultiAssetModel,
    contract: &C,
    analytic: Option<f64>,
) -> PricingResult<f64> {
    let result = pricer.price_detailed(contract, model)?;
    println!(
        "{:<22} {:>10.4} ± {:<8.4} {:>10} {:>8.1} ms",
        contract.name(),
        result.price,
        result.confidence_95(),
        analytic
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string()),
        result.elapsed.as_secs_f64() * 1000.0,
    );
    Ok(result.price)
}

fn run_demo(config: PricerConfig) -> PricingResult<()> {
    println!("Running parallel-mc Monte Carlo Demo\n");
    println!(
        "{} scenarios, {} steps, {} tasks, seed {}\n",
        config.scenarios, config.steps, config.tasks, config.seed
    );

    let (s0, k, r, sigma, t) = (100.0, 100.0, 0.01, 0.2, 1.0);
    let h = 120.0; // Barrier level
    let acme = MultiAssetModel::single_asset("Acme", s0, 0.05, sigma, r, 0.0)?;
    let pricer = ParallelMonteCarloPricer::new(config)?;

    let mut timer = Timer::new();
    timer.start();

    println!(
        "{:<22} {:>10}   {:<8} {:>10} {:>11}",
        "Contract", "Price", "95% CI", "Analytic", "Time"
    );
    println!("{:-<66}", "");
    let call = VanillaOption::call(k, t)?;
    let put = VanillaOption::put(k, t)?;
    report(&pricer, &acme, &call, Some(bs_analytic::bs_call_price(s0, k, r, sigma, t)))?;
    report(&pricer, &acme, &put, Some(bs_analytic::bs_put_price(s0, k, r, sigma, t)))?;
    let out = report(&pricer, &acme, &BarrierOption::up_and_out(k, h, t)?, None)?;
    let inn = report(&pricer, &acme, &BarrierOption::up_and_in(k, h, t)?, None)?;
    report(&pricer, &acme, &AsianOption::call(k, t)?, None)?;
    println!("\nUp-and-out + up-and-in = {:.4}", out + inn);

    println!("\nThree-asset model (Acme, Bigbank, Chumhum)");
    let model = MultiAssetModel::create_test_model();
    let sigma1 = model.volatility("Chumhum")?;
    let sigma2 = model.volatility("Bigbank")?;
    let rho = model.covariance()[[2, 1]] / (sigma1 * sigma2);
    report(
        &pricer,
        &model,
        &ExchangeOption::new("Chumhum", "Bigbank", t)?,
        Some(bs_analytic::margrabe_price(300.0, 200.0, sigma1, sigma2, rho, t)),
    )?;

    let mut book = Portfolio::new();
    book.add(100.0, VanillaOption::call(k, t)?)?;
    book.add(-100.0, VanillaOption::put(k, t)?)?;
    let parity = book.price(&pricer, &model)?;
    println!(
        "\n+100 calls / -100 puts on Acme: {:.2} (parity gives {:.2})",
        parity,
        100.0 * (model.spot("Acme")? - k)
    );

    println!("\nTotal time: {:.1} ms", timer.elapsed_ms());
    Ok(())
}
