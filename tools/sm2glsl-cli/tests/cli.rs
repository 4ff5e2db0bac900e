use std::fs;
use std::path::Path;

use tempfile::tempdir;

/// ps_2_0: `dcl t0`, `dcl_2d s0`, `texld r0, t0, s0`, `mov oC0, r0`.
const PS_2_0_TEXLD: [u32; 15] = [
    0xFFFF_0200,
    0x0200_001F,
    0x8000_0000,
    0xB00F_0000,
    0x0200_001F,
    0x9000_0000,
    0xA00F_0800,
    0x0300_0042,
    0x800F_0000,
    0xB0E4_0000,
    0xA0E4_0800,
    0x0200_0001,
    0x800F_0800,
    0x80E4_0000,
    0x0000_FFFF,
];

fn write_tokens(path: &Path, tokens: &[u32]) {
    let bytes: Vec<u8> = tokens.iter().flat_map(|t| t.to_le_bytes()).collect();
    fs::write(path, bytes).unwrap();
}

#[test]
fn prints_glsl_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.pso");
    write_tokens(&input, &PS_2_0_TEXLD);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.starts_with("#version 110\n"), "{stdout}");
    assert!(stdout.contains("ps_r0 = texture2D(ps_s0, ps_t0.xy);"), "{stdout}");
}

#[test]
fn writes_output_file_with_profile_and_entry_point() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.pso");
    let output = dir.path().join("sample.frag");
    write_tokens(&input, &PS_2_0_TEXLD);

    assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .args(["--profile", "GLSL120", "--main-fn", "ps_main", "--output"])
        .arg(&output)
        .assert()
        .success();

    let glsl = fs::read_to_string(&output).unwrap();
    assert!(glsl.starts_with("#version 120\n"), "{glsl}");
    assert!(glsl.contains("void ps_main()"), "{glsl}");
}

#[test]
fn json_report_lists_bindings() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.pso");
    write_tokens(&input, &PS_2_0_TEXLD);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .arg("--json")
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["profile"], "glsl");
    assert_eq!(report["shaderType"], "pixel");
    assert_eq!(report["version"], "2.0");
    assert_eq!(report["samplers"][0]["name"], "ps_s0");
    assert_eq!(report["samplers"][0]["kind"], "TwoD");
    assert_eq!(report["attributes"][0]["name"], "ps_t0");
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    assert!(report["glsl"].as_str().unwrap().contains("gl_FragColor"));
}

#[test]
fn shader_errors_exit_non_zero() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bogus.bin");
    write_tokens(&input, &[0x1234_0101, 0x0000_FFFF]);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .assert()
        .failure();
    let output = assert.get_output();
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unsupported shader type or not a shader at all in "),
        "{stderr}"
    );
    assert!(stderr.contains("bogus.bin at -2 (0xFFFFFFFE)"), "{stderr}");
}

#[test]
fn unknown_profile_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.pso");
    write_tokens(&input, &PS_2_0_TEXLD);

    let assert = assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .args(["--profile", "metal"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("unknown profile `metal`"), "{stderr}");
}

#[test]
fn missing_input_reports_the_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("absent.vso");

    let assert = assert_cmd::cargo::cargo_bin_cmd!("sm2glsl")
        .arg(&input)
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("absent.vso"), "{stderr}");
}
