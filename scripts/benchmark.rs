// scripts/benchmark.rs
use parallel_mc::analytics::bs_analytic;
use parallel_mc::config::PricerConfig;
use parallel_mc::math_utils::Timer;
use parallel_mc::mc::contracts::{BarrierOption, ExchangeOption, VanillaOption};
use parallel_mc::mc::mc_engine::ParallelMonteCarloPricer;
use parallel_mc::mc::payoffs::ContinuousTimeContract;
use parallel_mc::models::MultiAssetModel;
use parallel_mc::PricingResult;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process::Command;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rust_version: String,
    rustc_flags: String,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rust_version: Self::get_rust_version(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
        }
    }

    fn get_cpu_model() -> String {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|line| line.starts_with("model name"))
                    .and_then(|line| line.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
            .unwrap_or_else(|| "Unknown CPU".to_string())
    }

    fn get_rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    scenarios: usize,
    steps: usize,
    tasks: usize,
    time_ms: f64,
    throughput_scenarios_per_sec: f64,
    value: f64,
    standard_error: f64,
    analytic_value: Option<f64>,
}

fn task_counts() -> Vec<usize> {
    let cpus = num_cpus::get();
    let mut counts = vec![1];
    while counts[counts.len() - 1] * 2 <= cpus {
        counts.push(counts[counts.len() - 1] * 2);
    }
    if counts[counts.len() - 1] != cpus {
        counts.push(cpus);
    }
    counts
}

fn bench<C: ContinuousTimeContract>(
    name: &str,
    contract: &C,
    model: &MultiAssetModel,
    scenarios: usize,
    steps: usize,
    analytic_value: Option<f64>,
) -> PricingResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    for tasks in task_counts() {
        let config = PricerConfig::default()
            .with_scenarios(scenarios)
            .with_steps(steps)
            .with_tasks(tasks)
            .with_max_concurrency(tasks)
            .with_seed(42);
        let pricer = ParallelMonteCarloPricer::new(config)?;

        let mut timer = Timer::new();
        timer.start();
        let report = pricer.price_detailed(contract, model)?;
        let time_ms = timer.elapsed_ms();

        info!(name, tasks, price = report.price, time_ms, "benchmark run");
        results.push(BenchmarkResult {
            name: name.to_string(),
            scenarios,
            steps: report.steps,
            tasks,
            time_ms,
            throughput_scenarios_per_sec: scenarios as f64 / (time_ms / 1000.0),
            value: report.price,
            standard_error: report.standard_error,
            analytic_value,
        });
    }
    Ok(results)
}

fn run_benchmarks() -> PricingResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();

    let acme = MultiAssetModel::single_asset("Acme", 100.0, 0.05, 0.2, 0.05, 0.0)?;
    let call = VanillaOption::call(100.0, 1.0)?;
    for scenarios in [100_000, 1_000_000] {
        println!("European call, {} scenarios...", scenarios);
        let analytic = bs_analytic::bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        results.extend(bench(
            &format!("European Call ({}k)", scenarios / 1000),
            &call,
            &acme,
            scenarios,
            1,
            Some(analytic),
        )?);
    }

    println!("Up-and-out call, 52 steps...");
    let barrier = BarrierOption::up_and_out(100.0, 130.0, 1.0)?;
    results.extend(bench("Up-and-Out Call", &barrier, &acme, 200_000, 52, None)?);

    println!("Exchange option on the three-asset model...");
    let model = MultiAssetModel::create_test_model();
    let exchange = ExchangeOption::new("Bigbank", "Acme", 1.0)?;
    let sigma1 = model.volatility("Bigbank")?;
    let sigma2 = model.volatility("Acme")?;
    let rho = model.covariance()[[1, 0]] / (sigma1 * sigma2);
    let analytic = bs_analytic::margrabe_price(
        model.spot("Bigbank")?,
        model.spot("Acme")?,
        sigma1,
        sigma2,
        rho,
        1.0,
    );
    results.extend(bench(
        "Exchange Option",
        &exchange,
        &model,
        500_000,
        1,
        Some(analytic),
    )?);

    Ok(results)
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;

    // Write system information as comments
    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# Rust Version: {}", system_info.rust_version)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,Scenarios,Steps,Tasks,Time_ms,Throughput_scenarios_per_sec,Value,Std_Error,Analytic_Value"
    )?;
    for result in results {
        writeln!(
            file,
            "{},{},{},{},{:.2},{:.0},{:.6},{:.6},{}",
            result.name,
            result.scenarios,
            result.steps,
            result.tasks,
            result.time_ms,
            result.throughput_scenarios_per_sec,
            result.value,
            result.standard_error,
            result
                .analytic_value
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "N/A".to_string()),
        )?;
    }

    println!("Results written to {}", filename);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("parallel-mc Task Scaling Benchmark");
    println!("==================================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!();

    let results = match run_benchmarks() {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "benchmark failed");
            eprintln!("Benchmark failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<24} {:>9} {:>6} {:>6} {:>11} {:>14} {:>10} {:>9} {:>10}",
        "Benchmark", "Scenarios", "Steps", "Tasks", "Time (ms)", "Throughput", "Value", "Std Err", "Analytic"
    );
    println!("{:-<96}", "");
    for result in &results {
        println!(
            "{:<24} {:>9} {:>6} {:>6} {:>11.2} {:>14.0} {:>10.4} {:>9.4} {:>10}",
            result.name,
            result.scenarios,
            result.steps,
            result.tasks,
            result.time_ms,
            result.throughput_scenarios_per_sec,
            result.value,
            result.standard_error,
            result
                .analytic_value
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "N/A".to_string()),
        );
    }
    println!("{:=<96}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    if let Err(e) = write_results_to_csv(&results, &system_info, &filename) {
        eprintln!("Could not write {}: {}", filename, e);
        std::process::exit(1);
    }

    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!("3. Run: cargo run --bin benchmark --release");
}
