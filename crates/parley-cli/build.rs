use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder, RustcBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::all_build()?;
    let cargo = CargoBuilder::all_cargo()?;
    let rustc = RustcBuilder::all_rustc()?;

    let mut emitter = Emitter::default();
    emitter
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?;

    // Source tarballs have no git metadata; CI may pass it in instead
    match GitclBuilder::all_git() {
        Ok(git) => {
            emitter.add_instructions(&git)?;
        }
        Err(_) => {
            for (name, fallback) in [
                ("VERGEN_GIT_SHA", "unknown"),
                ("VERGEN_GIT_BRANCH", "unknown"),
                ("VERGEN_GIT_DIRTY", "false"),
            ] {
                let value = std::env::var(name).unwrap_or_else(|_| fallback.to_string());
                println!("cargo::rustc-env={name}={value}");
            }
        }
    }

    emitter.emit()?;

    Ok(())
}
