use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ngine_pack::NginePackArgs::from_args();

    // Setup logging
    let level = if args.trace {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::default()
        .write_style(env_logger::WriteStyle::Always)
        .filter_level(level)
        .init();

    ngine_pack::run(&args)
}
