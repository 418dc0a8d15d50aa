use std::fs::read_to_string;

use waiver_assign::{Problem, logging};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: <program> <problem_file.yaml>")?;

    let buf = read_to_string(path)?;
    let problem: Problem = serde_yaml::from_str(&buf)?;
    let solution = problem.solve()?;

    println!("{}", serde_yaml::to_string(&solution)?);
    Ok(())
}
