//! Binary that emits command-line options markdown to stdout.
//!
//! Used to regenerate `docs/command-line-options.md`.

fn main() {
    print!("{}", dsetui_cli::render_options_markdown());
}
