use {
    anyhow::Result,
    ctxswitch_registry::{ProjectRegistry, SymlinkState},
};

fn describe(state: &SymlinkState) -> String {
    match state {
        SymlinkState::Consistent { target: Some(t) } => format!("ok -> {}", t.display()),
        SymlinkState::Consistent { target: None } => "ok (no active project, no alias)".into(),
        SymlinkState::Missing { expected } => {
            format!("missing (should point at {})", expected.display())
        },
        SymlinkState::Broken { target } => format!("broken -> {} (does not exist)", target.display()),
        SymlinkState::Stale {
            target,
            expected: Some(expected),
        } => format!(
            "stale -> {} (should point at {})",
            target.display(),
            expected.display()
        ),
        SymlinkState::Stale {
            target,
            expected: None,
        } => format!("stale -> {} (no project is active)", target.display()),
        SymlinkState::NotASymlink => "occupied by something that is not a symlink".into(),
    }
}

pub async fn handle_link(registry: &dyn ProjectRegistry, fix: bool) -> Result<()> {
    let report = if fix {
        registry.repair_symlink().await?
    } else {
        registry.validate_symlink().await?
    };
    println!("alias: {}", describe(&report.state));

    if report.state.is_consistent() {
        return Ok(());
    }
    match report.fix {
        Some(repair) if fix => match repair.target() {
            Some(target) => println!("repointed alias at {}", target.display()),
            None => println!("removed alias"),
        },
        Some(_) => println!("run `ctxswitch link --fix` to repair"),
        None => {
            eprintln!("cannot be repaired automatically; inspect the alias path by hand");
            std::process::exit(1);
        },
    }
    Ok(())
}
