// src/main.rs

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use log::info;

use aeroquery::engine::Engine;

const DATA_DIR: &str = "data.aeroquery";

fn main() -> io::Result<()> {
    env_logger::init();
    let dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DATA_DIR));
    info!("AeroQuery (data in {}). Type .exit to quit.", dir.display());

    let mut engine = match Engine::open(&dir) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("cannot open {}: {}", dir.display(), e);
            return Err(io::Error::other(e.to_string()));
        }
    };

    loop {
        print!("aeroquery> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break; // EOF
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case(".exit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let explain = trimmed
            .get(..8)
            .filter(|p| p.eq_ignore_ascii_case("EXPLAIN "))
            .map(|_| &trimmed[8..]);
        if let Some(sql) = explain {
            match engine.explain_sql(sql) {
                Ok(plan) => print!("{}", plan),
                Err(e) => eprintln!("{} error: {}", kind_label(&e), e),
            }
            continue;
        }

        match engine.execute_sql(trimmed) {
            Ok(output) => println!("{}", output),
            Err(e) => eprintln!("{} error: {}", kind_label(&e), e),
        }
    }
    Ok(())
}

fn kind_label(e: &aeroquery::error::DbError) -> &'static str {
    use aeroquery::error::ErrorKind::*;
    match e.kind() {
        Reference => "reference",
        Type => "type",
        Schema => "schema",
        Parse => "parse",
        Execution => "execution",
    }
}
