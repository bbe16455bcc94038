use std::time::Duration;

use clap::Parser;

use tube_cn::contractor::Ctc;
use tube_cn::ctc::CtcDeriv;
use tube_cn::interval::Interval;
use tube_cn::network::ContractorNetwork;
use tube_cn::tube::Tube;

/// Dead reckoning of a 1-D robot: the position tube is bounded from streamed velocity measurements.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Mission duration.
    #[arg(long, value_name = "FLOAT", default_value = "10.0")]
    duration: f64,

    /// Slice width of the tubes.
    #[arg(long, value_name = "FLOAT", default_value = "0.1")]
    timestep: f64,

    /// Half-width of the velocity measurement error.
    #[arg(long, value_name = "FLOAT", default_value = "0.05")]
    noise: f64,

    /// Contraction budget per measurement, in milliseconds.
    #[arg(long, value_name = "INT", default_value = "5")]
    budget: u64,

    /// Log every propagation step.
    #[clap(long)]
    verbose: bool,
}

fn velocity(t: f64) -> f64 {
    1.0 + 0.5 * t.sin()
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();
    println!("args = {:?}", args);

    let tdomain = Interval::new(0.0, args.duration);
    let mut x = Tube::new(tdomain, args.timestep, Interval::ALL_REALS);
    x.set_gate(0, Interval::new(0.0, 0.0));
    let v = Tube::new(tdomain, args.timestep, Interval::ALL_REALS);

    let mut cn = ContractorNetwork::new();
    let x = cn.create_dom(x)?;
    let v = cn.create_dom(v)?;
    cn.set_name(x, "x")?;
    cn.set_name(v, "v")?;
    cn.add(&Ctc::new_dynamic(CtcDeriv), &[x, v])?;
    println!("cn = {}", cn.summary());

    // Measurements arrive at a higher rate than the slicing.
    let dt = args.timestep / 2.0;
    let budget = Duration::from_millis(args.budget);
    let nb_steps = (args.duration / dt).round() as usize;
    for i in 0..=nb_steps {
        let t = (i as f64 * dt).min(args.duration);
        let y = Interval::new(velocity(t) - args.noise, velocity(t) + args.noise);
        cn.add_data(v, t, y)?;
        cn.contract_during(budget, args.verbose)?;
    }
    let elapsed = cn.contract(args.verbose)?;
    println!("final contraction: {:.3}s, {} executions", elapsed, cn.nb_ctc_executions());

    let tube = cn.tube(x)?;
    for t in 0..=args.duration.floor() as usize {
        let t = t as f64;
        println!("x({:.1}) in {}", t, tube.eval(Interval::new(t, t)));
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.2} s", time_total.as_secs_f64());

    Ok(())
}
