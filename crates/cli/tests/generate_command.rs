//! Integration tests for `overgen generate`.
//!
//! Each test writes a configuration into a temp dir and runs the command
//! through `run_cli`, the same entry point the binary uses.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use overgen_cli::run_cli;

const CONFIG: &str = r#"
[generator]
function_name = "list"
additional_params = [["page_info", "PageInfo"]]
is_async = true
return_type_fallback = "ModelType"

[output]
extra_imports = [
    "from seerapi._model_map import ModelName, ModelType",
    "import seerapi_models as M",
]

[mapping]
pet = "M.Pet"
skill = "M.Skill"
"#;

const EXPECTED: &str = "\
from typing import overload, Literal
from seerapi._model_map import ModelName, ModelType
import seerapi_models as M

@overload
async def list(self, resource_name: Literal['pet'], page_info: PageInfo) -> M.Pet:
    ...


@overload
async def list(self, resource_name: Literal['skill'], page_info: PageInfo) -> M.Skill:
    ...
";

fn cli(args: &[&str]) -> i32 {
    let mut argv = vec!["overgen".to_string()];
    argv.extend(args.iter().map(ToString::to_string));
    run_cli(argv)
}

#[test]
fn generate_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("overloads.toml");
    let out = dir.path().join("seerapi").join("_client_generated.py");
    fs::write(&config, CONFIG).unwrap();

    let code = cli(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);

    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), EXPECTED);
}

#[test]
fn check_detects_drift() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("overloads.toml");
    let out = dir.path().join("_client_generated.py");
    fs::write(&config, CONFIG).unwrap();
    fs::write(&out, EXPECTED).unwrap();

    let args = [
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--check",
    ];
    assert_eq!(cli(&args), 0);

    fs::write(&out, EXPECTED.replace("M.Skill", "M.Item")).unwrap();
    assert_eq!(cli(&args), 1);
    assert!(fs::read_to_string(&out).unwrap().contains("M.Item"));
}

#[test]
fn flags_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("overloads.toml");
    let out = dir.path().join("out.py");
    fs::write(&config, CONFIG).unwrap();

    let code = cli(&[
        "generate",
        "-c",
        config.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--function-name",
        "fetch",
        "--no-self",
    ]);

    assert_eq!(code, 0);
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("async def fetch(resource_name: Literal['pet'], page_info: PageInfo) -> M.Pet:"));
}

#[test]
fn invalid_configuration_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("overloads.json");
    let out = dir.path().join("out.py");
    fs::write(
        &config,
        r#"{ "generator": { "function_name": "get" }, "mapping": {} }"#,
    )
    .unwrap();

    let code = cli(&[
        "generate",
        "--config",
        config.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);

    assert_eq!(code, 1);
    assert!(!out.exists());
}

#[test]
fn check_accepts_color_choice() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("overloads.toml");
    let out = dir.path().join("_client_generated.py");
    fs::write(&config, CONFIG).unwrap();
    fs::write(&out, EXPECTED.replace("M.Pet", "M.Item")).unwrap();

    for color in ["never", "always", "auto"] {
        let code = cli(&[
            "generate",
            "--config",
            config.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--check",
            "--color",
            color,
        ]);
        assert_eq!(code, 1, "--color {color}");
    }
    assert_eq!(cli(&["generate", "--config", "x.toml", "--color", "sometimes"]), 2);
}

#[test]
fn check_requires_out() {
    assert_eq!(cli(&["generate", "--config", "x.toml", "--check"]), 2);
}
