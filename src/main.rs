fn main() {
    if let Err(err) = dwh_sampler::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
