use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use hdrhistogram::Histogram;
use tracing_subscriber::EnvFilter;

use hops::{
    HopUnit, HoppingCounterRegistry, HoppingWindowCounter, HoppingWindowOptions, WindowUnits,
};

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum Target {
    /// A single shared counter.
    Counter,
    /// One counter per key.
    Registry,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeyDist {
    Hot,
    Uniform,
    Skewed,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "hops-stress", about = "Load test / benchmark harness for hops")]
struct Args {
    #[arg(long, value_enum, default_value_t = Target::Counter)]
    target: Target,

    #[arg(long, value_enum, default_value_t = KeyDist::Hot)]
    key_dist: KeyDist,

    /// Threads calling `observe`.
    #[arg(long, default_value_t = 8)]
    threads: usize,

    /// Threads calling `value` in a loop.
    #[arg(long, default_value_t = 2)]
    readers: usize,

    #[arg(long, default_value_t = 10)]
    duration_s: u64,

    #[arg(long, default_value_t = 60)]
    window_units: usize,

    #[arg(long, default_value_t = 1000)]
    unit_ms: u64,

    #[arg(long, default_value_t = 100_000)]
    key_space: usize,

    #[arg(long, default_value_t = 0.8)]
    hot_fraction: f64,

    #[arg(long, default_value_t = 100)]
    sample_every: u64,

    /// Run `cleanup` every N milliseconds when targeting the registry.
    #[arg(long)]
    cleanup_ms: Option<u64>,
}

enum Subject {
    Counter(HoppingWindowCounter),
    Registry(Arc<HoppingCounterRegistry>),
}

impl Subject {
    fn observe(&self, key: &str) {
        match self {
            Subject::Counter(counter) => counter.observe(),
            Subject::Registry(registry) => registry.observe(key),
        }
    }

    fn value(&self, key: &str) -> u64 {
        match self {
            Subject::Counter(counter) => counter.value(),
            Subject::Registry(registry) => registry.value(key),
        }
    }
}

fn build_subject(args: &Args) -> Result<Subject, hops::HopsError> {
    let options = HoppingWindowOptions {
        window_units: WindowUnits::try_from(args.window_units)?,
        unit: HopUnit::millis(args.unit_ms)?,
    };

    Ok(match args.target {
        Target::Counter => Subject::Counter(HoppingWindowCounter::new(options)?),
        Target::Registry => {
            let registry = Arc::new(HoppingCounterRegistry::new(options)?);
            if let Some(cleanup_ms) = args.cleanup_ms {
                registry.run_cleanup_loop(Duration::from_millis(cleanup_ms));
            }
            Subject::Registry(registry)
        }
    })
}

fn build_keys(args: &Args) -> Vec<String> {
    let n = match (args.target, args.key_dist) {
        (Target::Counter, _) | (_, KeyDist::Hot) => 1,
        _ => args.key_space.max(1),
    };
    (0..n).map(|i| format!("user_{i}")).collect()
}

fn should_sample(iter: u64, sample_every: u64) -> bool {
    if sample_every <= 1 {
        return true;
    }

    iter.is_multiple_of(sample_every)
}

fn pick_key<'a>(args: &Args, keys: &'a [String], thread_rng: &mut impl FnMut() -> u64) -> &'a str {
    match args.key_dist {
        KeyDist::Hot => &keys[0],
        KeyDist::Uniform => {
            let idx = (thread_rng() as usize) % keys.len();
            &keys[idx]
        }
        KeyDist::Skewed => {
            let r = (thread_rng() % 10_000) as f64 / 10_000.0;
            if r < args.hot_fraction {
                &keys[0]
            } else {
                let idx = 1 + ((thread_rng() as usize) % (keys.len().saturating_sub(1).max(1)));
                &keys[idx % keys.len()]
            }
        }
    }
}

fn new_histogram() -> Histogram<u64> {
    Histogram::<u64>::new_with_bounds(1, 60_000_000, 3).expect("valid histogram bounds")
}

fn print_latencies(label: &str, hist: &Histogram<u64>) {
    if hist.is_empty() {
        println!("{label}: no latency samples collected");
        return;
    }

    println!(
        "{label}: lat_ns p50={} p95={} p99={} p999={} max={} samples={}",
        hist.value_at_quantile(0.50),
        hist.value_at_quantile(0.95),
        hist.value_at_quantile(0.99),
        hist.value_at_quantile(0.999),
        hist.max(),
        hist.len()
    );
}

fn run(args: Args) -> Result<(), hops::HopsError> {
    let subject = Arc::new(build_subject(&args)?);
    let keys = Arc::new(build_keys(&args));

    let stop = Arc::new(AtomicBool::new(false));
    let observed = Arc::new(AtomicU64::new(0));
    let reads = Arc::new(AtomicU64::new(0));

    tracing::info!(?args, "stress.start");
    let started = Instant::now();

    let mut writers = Vec::with_capacity(args.threads);
    for t in 0..args.threads {
        let subject = Arc::clone(&subject);
        let keys = Arc::clone(&keys);
        let stop = Arc::clone(&stop);
        let observed = Arc::clone(&observed);
        let args = args.clone();

        writers.push(std::thread::spawn(move || {
            let mut hist = new_histogram();
            let mut i = 0_u64;
            let mut seed = (t as u64 + 1) * 0x9E37_79B9_7F4A_7C15;

            let mut rng_u64 = || {
                // xorshift64*
                seed ^= seed >> 12;
                seed ^= seed << 25;
                seed ^= seed >> 27;
                seed = seed.wrapping_mul(0x2545_F491_4F6C_DD1D);
                seed
            };

            while !stop.load(Ordering::Relaxed) {
                i = i.wrapping_add(1);
                let k = pick_key(&args, &keys, &mut rng_u64);
                let t0 = should_sample(i, args.sample_every).then(Instant::now);

                subject.observe(k);

                if let Some(t0) = t0 {
                    let ns = t0.elapsed().as_nanos() as u64;
                    let _ = hist.record(ns.max(1));
                }
                observed.fetch_add(1, Ordering::Relaxed);
            }

            hist
        }));
    }

    let mut readers = Vec::with_capacity(args.readers);
    for _ in 0..args.readers {
        let subject = Arc::clone(&subject);
        let keys = Arc::clone(&keys);
        let stop = Arc::clone(&stop);
        let reads = Arc::clone(&reads);
        let sample_every = args.sample_every;

        readers.push(std::thread::spawn(move || {
            let mut hist = new_histogram();
            let mut i = 0_u64;

            while !stop.load(Ordering::Relaxed) {
                i = i.wrapping_add(1);
                let t0 = should_sample(i, sample_every).then(Instant::now);

                std::hint::black_box(subject.value(&keys[0]));

                if let Some(t0) = t0 {
                    let ns = t0.elapsed().as_nanos() as u64;
                    let _ = hist.record(ns.max(1));
                }
                reads.fetch_add(1, Ordering::Relaxed);
            }

            hist
        }));
    }

    std::thread::sleep(Duration::from_secs(args.duration_s));
    stop.store(true, Ordering::Relaxed);

    let mut observe_hist = new_histogram();
    for h in writers {
        if let Ok(hist) = h.join() {
            let _ = observe_hist.add(&hist);
        }
    }

    let mut value_hist = new_histogram();
    for h in readers {
        if let Ok(hist) = h.join() {
            let _ = value_hist.add(&hist);
        }
    }

    let elapsed = started.elapsed();
    let observed = observed.load(Ordering::Relaxed);
    let reads = reads.load(Ordering::Relaxed);

    println!(
        "target={:?} key_dist={:?} threads={} readers={} window_units={} unit_ms={}",
        args.target, args.key_dist, args.threads, args.readers, args.window_units, args.unit_ms
    );
    println!(
        "elapsed_s={:.3} observes={} observes_per_s={:.0} reads={} reads_per_s={:.0}",
        elapsed.as_secs_f64(),
        observed,
        observed as f64 / elapsed.as_secs_f64(),
        reads,
        reads as f64 / elapsed.as_secs_f64(),
    );
    print_latencies("observe", &observe_hist);
    print_latencies("value", &value_hist);

    if let Subject::Counter(counter) = subject.as_ref() {
        let value = counter.value();
        let window_ms = args.window_units as u128 * args.unit_ms as u128;
        if elapsed.as_millis() + (args.unit_ms as u128) < window_ms && value != observed {
            tracing::warn!(value, observed, "stress.mismatch, counter lost or doubled events");
        }
        println!("final_value={value}");
    }

    if let Subject::Registry(registry) = subject.as_ref() {
        registry.stop_cleanup_loop();
        println!("keys={}", registry.len());
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
