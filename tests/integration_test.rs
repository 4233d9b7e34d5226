// tests/integration_test.rs
use ndarray::{arr1, arr2};
use parallel_mc::analytics::bs_analytic;
use parallel_mc::config::PricerConfig;
use parallel_mc::mc::contracts::{AsianOption, ExchangeOption, Portfolio, VanillaOption};
use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
use parallel_mc::models::{BlackScholesModel, MultiAssetModel};

fn pricer(scenarios: usize) -> ParallelMonteCarloPricer {
    let config = PricerConfig::default()
        .with_scenarios(scenarios)
        .with_tasks(8)
        .with_seed(42);
    ParallelMonteCarloPricer::new(config).expect("Valid configuration")
}

#[test]
fn test_call_converges_to_black_scholes() {
    // Valuation date 1, maturity 2: one year to expiry
    let bsm = BlackScholesModel::new(100.0, 0.0, 0.1, 0.05, 1.0).expect("Valid model");
    let model = MultiAssetModel::from_black_scholes(&bsm).expect("Valid model");
    let call = VanillaOption::call(110.0, 2.0).expect("Valid contract");

    let report = pricer(100_000)
        .price_detailed(&call, &model)
        .expect("Priced");
    let analytic = bsm.call_price(110.0, 2.0);

    println!("\nMC Price: {}", report.price);
    println!("Analytic Price: {}", analytic);
    println!("Standard Error: {}", report.standard_error);
    println!("Elapsed: {:?}", report.elapsed);

    assert!(
        (report.price - analytic).abs() < 0.1,
        "MC price {} too far from analytic {}",
        report.price,
        analytic
    );
    assert!(report.standard_error < 0.05);
}

#[test]
fn test_put_converges_to_black_scholes() {
    let model = MultiAssetModel::single_asset("Acme", 100.0, 0.0, 0.1, 0.05, 1.0).expect("Valid model");
    let put = VanillaOption::put(110.0, 2.0).expect("Valid contract");

    let mc_price = pricer(100_000).price(&put, &model).expect("Priced");
    let analytic = bs_analytic::bs_put_price(100.0, 110.0, 0.05, 0.1, 1.0);

    println!("\nMC Put: {} Analytic Put: {}", mc_price, analytic);
    assert!((mc_price - analytic).abs() < 0.1);
}

#[test]
fn test_exchange_option_converges_to_margrabe() {
    let (s1, s2, sigma1, sigma2, rho) = (100.0, 95.0, 0.2, 0.3, 0.5);
    let model = MultiAssetModel::new(
        vec!["Stock1".to_string(), "Stock2".to_string()],
        arr1(&[s1, s2]),
        arr1(&[0.0, 0.0]),
        arr2(&[
            [sigma1 * sigma1, rho * sigma1 * sigma2],
            [rho * sigma1 * sigma2, sigma2 * sigma2],
        ]),
    )
    .expect("Valid model")
    .with_risk_free_rate(0.03);
    let option = ExchangeOption::new("Stock1", "Stock2", 1.0).expect("Valid contract");

    let report = pricer(100_000)
        .price_detailed(&option, &model)
        .expect("Priced");
    let analytic = bs_analytic::margrabe_price(s1, s2, sigma1, sigma2, rho, 1.0);

    println!("\nMC Exchange: {} ± {}", report.price, report.standard_error);
    println!("Margrabe: {}", analytic);
    assert!((report.price - analytic).abs() < 5.0 * report.standard_error + 0.01);
}

#[test]
fn test_put_call_parity_through_portfolio() {
    let (spot, strike) = (100.0, 90.0);
    let model = MultiAssetModel::single_asset("Acme", spot, 0.0, 0.1, 0.0, 0.0).expect("Valid model");

    let mut book = Portfolio::new();
    book.add(100.0, VanillaOption::call(strike, 1.0).expect("Valid contract"))
        .expect("Valid quantity");
    book.add(-100.0, VanillaOption::put(strike, 1.0).expect("Valid contract"))
        .expect("Valid quantity");

    let value = book.price(&pricer(200_000), &model).expect("Priced");
    println!("\nPortfolio value: {} (expected {})", value, 100.0 * (spot - strike));
    assert!((value - 100.0 * (spot - strike)).abs() < 10.0);
}

#[test]
fn test_asian_cheaper_than_european() {
    let model = MultiAssetModel::single_asset("Acme", 100.0, 0.0, 0.2, 0.05, 0.0).expect("Valid model");
    let pricer = ParallelMonteCarloPricer::new(
        PricerConfig::default()
            .with_scenarios(20_000)
            .with_steps(12)
            .with_tasks(4),
    )
    .expect("Valid configuration");

    let asian = pricer
        .price(&AsianOption::call(100.0, 1.0).expect("Valid contract"), &model)
        .expect("Priced");
    let european = pricer
        .price(&VanillaOption::call(100.0, 1.0).expect("Valid contract"), &model)
        .expect("Priced");

    println!("\nAsian: {} European: {}", asian, european);
    assert!(asian > 0.0);
    assert!(asian < european);
}

#[test]
fn test_pricer_from_toml() {
    let config = PricerConfig::from_toml_str(
        r#"
        scenarios = 4000
        steps = 4
        tasks = 3
        seed = 7
        "#,
    )
    .expect("Valid configuration");
    assert_eq!(config.scenarios, 4000);

    let model = MultiAssetModel::create_test_model();
    let call = VanillaOption::call(100.0, 1.0).expect("Valid contract");
    let report = ParallelMonteCarloPricer::new(config)
        .expect("Valid configuration")
        .price_detailed(&call, &model)
        .expect("Priced");
    assert_eq!(report.scenarios, 4000);
    assert_eq!(report.tasks, 3);
}
