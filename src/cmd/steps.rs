//! Step catalogue: `shipyard steps`.

use shipyard::pipeline::StepKind;

pub fn cmd_steps() {
    println!();
    println!("{}", console::style("Pipeline steps").bold().cyan());
    println!();
    for kind in StepKind::all() {
        println!(
            "  {:<10} {}",
            kind.as_str().to_lowercase(),
            console::style(kind.description()).dim()
        );
    }
    println!();
}
