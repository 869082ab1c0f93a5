// `cargo xtask coverage` and friends for the workspace.
fn main() -> Result<(), anyhow::Error> {
    xtaskops::tasks::main()
}
