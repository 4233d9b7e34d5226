// demos/error_handling_demo.rs
use ndarray::{arr1, arr2};
use parallel_mc::config::PricerConfig;
use parallel_mc::error::PricingError;
use parallel_mc::mc::contracts::{ExchangeOption, VanillaOption};
use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
use parallel_mc::models::MultiAssetModel;

fn main() {
    println!("Error Handling Demo for parallel-mc");
    println!("===================================\n");

    // Test 1: Mismatched model dimensions
    println!("1. Testing mismatched model dimensions...");
    match MultiAssetModel::new(
        vec!["Acme".to_string(), "Bigbank".to_string()],
        arr1(&[100.0, 200.0]),
        arr1(&[0.0]),
        arr2(&[[0.04, 0.0], [0.0, 0.04]]),
    ) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 2: Covariance that cannot be factorised
    println!("\n2. Testing a covariance matrix that is not positive definite...");
    let pricer = match ParallelMonteCarloPricer::new(PricerConfig::default().with_scenarios(10_000)) {
        Ok(pricer) => pricer,
        Err(e) => {
            println!("   Unexpected: {}", e);
            return;
        }
    };
    let bad_model = MultiAssetModel::new(
        vec!["Acme".to_string(), "Bigbank".to_string()],
        arr1(&[100.0, 200.0]),
        arr1(&[0.0, 0.0]),
        arr2(&[[0.04, 0.09], [0.09, 0.04]]),
    );
    let spread = ExchangeOption::new("Acme", "Bigbank", 1.0);
    match (bad_model, spread) {
        (Ok(model), Ok(spread)) => match pricer.price(&spread, &model) {
            Ok(_) => println!("   Unexpected: Should have failed!"),
            Err(e @ PricingError::NotPositiveDefinite { .. }) => {
                println!("   ✓ Caught error: {}", e)
            }
            Err(e) => println!("   Unexpected error kind: {}", e),
        },
        (Err(e), _) | (_, Err(e)) => println!("   Unexpected: {}", e),
    }

    // Test 3: Contract on an asset the model does not know
    println!("\n3. Testing a contract on an unknown asset...");
    let model = MultiAssetModel::create_test_model();
    match ExchangeOption::new("Acme", "Dunder", 1.0).and_then(|c| pricer.price(&c, &model)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 4: Invalid pricer configuration
    println!("\n4. Testing zero tasks...");
    match ParallelMonteCarloPricer::new(PricerConfig::default().with_tasks(0)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    println!("\n5. Testing a malformed TOML configuration...");
    match PricerConfig::from_toml_str("scenarios = \"many\"") {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 6: Invalid contract parameters
    println!("\n6. Testing a negative strike...");
    match VanillaOption::call(-10.0, 1.0) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 7: Maturity before the valuation date
    println!("\n7. Testing maturity before the model date...");
    let dated = MultiAssetModel::create_test_model().with_date(2.0);
    match VanillaOption::call(100.0, 1.0).and_then(|c| pricer.price(&c, &dated)) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 8: Valid pricing for comparison
    println!("\n8. Testing valid pricing...");
    match VanillaOption::call(100.0, 1.0).and_then(|c| pricer.price_detailed(&c, &model)) {
        Ok(report) => println!(
            "   ✓ Priced: {:.4} ± {:.4} over {} tasks",
            report.price,
            report.confidence_95(),
            report.tasks
        ),
        Err(e) => println!("   Unexpected: {}", e),
    }

    println!("\nError handling demo complete!");
}
