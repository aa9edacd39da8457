use starter_config::{app, ui};

fn main() {
    let cli = app::parse_args();

    if let Err(e) = app::handle_configure(cli) {
        ui::print_error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
