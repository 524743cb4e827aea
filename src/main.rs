fn main() -> std::process::ExitCode {
    streammix_lib::run()
}
