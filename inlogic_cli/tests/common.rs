use assert_cmd::Command;

pub fn inlogic_cmd() -> Command {
	let mut cmd = Command::cargo_bin("inlogic").expect("inlogic binary should be built");
	cmd.env("NO_COLOR", "1");
	cmd
}
