// tests/reproducibility_test.rs
use parallel_mc::config::PricerConfig;
use parallel_mc::mc::contracts::{AsianOption, BarrierOption, ExchangeOption, VanillaOption};
use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
use parallel_mc::mc::payoffs::ContinuousTimeContract;
use parallel_mc::models::MultiAssetModel;

fn pricer_with(config: PricerConfig) -> ParallelMonteCarloPricer {
    ParallelMonteCarloPricer::new(config.with_seed(2024)).expect("Valid configuration")
}

fn assert_task_invariant<C: ContinuousTimeContract>(contract: &C, scenarios: usize, steps: usize) {
    let model = MultiAssetModel::create_test_model().with_risk_free_rate(0.02);
    let pricer = pricer_with(PricerConfig::default());

    let one = pricer
        .price_with(contract, &model, scenarios, steps, 1)
        .expect("Priced");
    let ten = pricer
        .price_with(contract, &model, scenarios, steps, 10)
        .expect("Priced");

    println!("{}: 1 task {} / 10 tasks {}", contract.name(), one, ten);
    assert!((one - ten).abs() < 1e-6, "{} vs {}", one, ten);
}

#[test]
fn test_vanilla_independent_of_task_count() {
    assert_task_invariant(&VanillaOption::call(105.0, 1.0).expect("Valid contract"), 50_000, 1);
}

#[test]
fn test_barrier_independent_of_task_count() {
    let option = BarrierOption::up_and_out(100.0, 125.0, 1.0).expect("Valid contract");
    assert_task_invariant(&option, 20_000, 25);
}

#[test]
fn test_asian_independent_of_task_count() {
    let option = AsianOption::call(100.0, 1.0)
        .expect("Valid contract");
    assert_task_invariant(&option, 10_000, 12);
}

#[test]
fn test_exchange_independent_of_task_count() {
    let option = ExchangeOption::new("Chumhum", "Bigbank", 1.0).expect("Valid contract");
    assert_task_invariant(&option, 30_000, 1);
}

#[test]
fn test_uneven_split_prices_every_scenario() {
    let model = MultiAssetModel::create_test_model();
    let call = VanillaOption::call(100.0, 1.0).expect("Valid contract");
    let pricer = pricer_with(PricerConfig::default());

    let whole = pricer
        .price_detailed_with(&call, &model, 10_007, 1, 1)
        .expect("Priced");
    let split = pricer
        .price_detailed_with(&call, &model, 10_007, 1, 6)
        .expect("Priced");

    assert_eq!(split.scenarios, 10_007);
    assert!((whole.price - split.price).abs() < 1e-6);
    assert!((whole.standard_error - split.standard_error).abs() < 1e-9);
}

#[test]
fn test_more_tasks_than_scenarios() {
    let model = MultiAssetModel::create_test_model();
    let call = VanillaOption::call(100.0, 1.0).expect("Valid contract");
    let pricer = pricer_with(PricerConfig::default());

    let report = pricer
        .price_detailed_with(&call, &model, 5, 1, 16)
        .expect("Priced");
    let single = pricer.price_with(&call, &model, 5, 1, 1).expect("Priced");
    assert_eq!(report.tasks, 5);
    assert!((report.price - single).abs() < 1e-9);
}

#[test]
fn test_batch_size_is_not_observable() {
    let model = MultiAssetModel::create_test_model();
    let option = BarrierOption::down_and_out(100.0, 85.0, 1.0).expect("Valid contract");

    let large = pricer_with(PricerConfig::default())
        .price_with(&option, &model, 8_000, 16, 4)
        .expect("Priced");
    let small = pricer_with(PricerConfig::default().with_max_batch_cells(160))
        .price_with(&option, &model, 8_000, 16, 4)
        .expect("Priced");

    println!("large batches {} / small batches {}", large, small);
    assert!((large - small).abs() < 1e-9);
}

#[test]
fn test_concurrency_limit_is_not_observable() {
    let model = MultiAssetModel::create_test_model();
    let call = VanillaOption::call(95.0, 1.0).expect("Valid contract");

    let serial = pricer_with(PricerConfig::default().with_max_concurrency(1))
        .price_with(&call, &model, 20_000, 1, 8)
        .expect("Priced");
    let parallel = pricer_with(PricerConfig::default().with_max_concurrency(8))
        .price_with(&call, &model, 20_000, 1, 8)
        .expect("Priced");
    assert_eq!(serial, parallel);
}

#[test]
fn test_seed_changes_price() {
    let model = MultiAssetModel::create_test_model();
    let call = VanillaOption::call(100.0, 1.0).expect("Valid contract");
    let a = ParallelMonteCarloPricer::new(PricerConfig::default().with_seed(1))
        .expect("Valid configuration")
        .price_with(&call, &model, 2_000, 1, 2)
        .expect("Priced");
    let b = ParallelMonteCarloPricer::new(PricerConfig::default().with_seed(2))
        .expect("Valid configuration")
        .price_with(&call, &model, 2_000, 1, 2)
        .expect("Priced");
    assert_ne!(a, b);
}
