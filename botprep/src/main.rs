fn main() {
    let code = botprep::run_cli();
    std::process::exit(code);
}
