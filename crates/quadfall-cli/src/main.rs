mod command;
mod logging;
mod score_file;
mod ui;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
