//! Integration tests for the `cymbalum` binary.

use std::process::Command;
use tempfile::TempDir;

fn cymbalum_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cymbalum"))
}

fn read_wav(path: &std::path::Path) -> (hound::WavSpec, Vec<f32>) {
    let reader = hound::WavReader::open(path).expect("output should be a valid WAV");
    let spec = reader.spec();
    let samples = reader
        .into_samples::<f32>()
        .collect::<Result<Vec<_>, _>>()
        .expect("output should hold float samples");
    (spec, samples)
}

#[test]
fn params_lists_every_parameter() {
    let output = cymbalum_bin().arg("params").output().unwrap();
    assert!(output.status.success(), "cymbalum params failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["bypass", "seed", "osc_type", "units", "decay", "lfo_shape"] {
        assert!(stdout.contains(name), "params listing should contain '{name}'");
    }
}

#[test]
fn params_group_filter() {
    let output = cymbalum_bin()
        .args(["params", "--group", "lfo"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lfo_beats"));
    assert!(!stdout.contains("bandpass_q"), "should hide other groups");

    let output = cymbalum_bin()
        .args(["params", "--group", "reverb"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "unknown group should fail");
}

#[test]
fn info_reports_selected_variant() {
    let output = cymbalum_bin().arg("info").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Engine variants"));
    assert!(stdout.contains("scalar"));
    assert!(stdout.contains("Selected:"));
}

#[test]
fn render_writes_float_wav() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("hit.wav");

    let output = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .args(["--notes", "60@0.0-0.1,67@0.05-0.2:0.5"])
        .args(["--duration", "0.5", "--sample-rate", "44100", "--block-size", "100"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (spec, samples) = read_wav(&out);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(samples.len(), 22050);
    assert!(samples.iter().all(|x| x.is_finite()));
    assert!(samples.iter().any(|&x| x != 0.0), "should render sound");
}

#[test]
fn render_is_deterministic_for_a_seed() {
    let dir = TempDir::new().unwrap();
    let render = |name: &str, seed: &str| {
        let path = dir.path().join(name);
        let status = cymbalum_bin()
            .arg("render")
            .arg(&path)
            .args(["--notes", "62@0.0-0.1", "--duration", "0.25", "--seed", seed])
            .status()
            .unwrap();
        assert!(status.success());
        read_wav(&path).1
    };

    let a = render("a.wav", "7");
    let b = render("b.wav", "7");
    let c = render("c.wav", "8");
    assert_eq!(a, b, "same seed should render identical audio");
    assert_ne!(a, c, "different seeds should render different audio");
}

#[test]
fn render_uses_config_and_saves_state() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("engine.toml");
    let out = dir.path().join("out.wav");
    let state = dir.path().join("engine.state");

    std::fs::write(
        &config,
        "sample_rate = 32000\nblock_size = 64\nvariants = [\"scalar\"]\n\n[params]\nunits = 12\ndecay = 0.5\n",
    )
    .unwrap();

    let output = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .args(["--notes", "48@0-0.05", "--duration", "0.1", "--param", "bandpass_q=8"])
        .arg("--state")
        .arg(&state)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(read_wav(&out).0.sample_rate, 32000);

    let output = cymbalum_bin().arg("state").arg(&state).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("units"));
    assert!(stdout.contains("0 defaulted"), "got: {stdout}");

    let output = cymbalum_bin()
        .arg("state")
        .arg(&state)
        .arg("--toml")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("units = 12"), "got: {stdout}");
    assert!(stdout.contains("bandpass_q = "), "got: {stdout}");
}

#[test]
fn render_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.wav");

    let bad_note = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .args(["--notes", "60@1.0"])
        .output()
        .unwrap();
    assert!(!bad_note.status.success());

    let bad_param = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .args(["--param", "units=99"])
        .output()
        .unwrap();
    assert!(!bad_param.status.success());
    assert!(String::from_utf8_lossy(&bad_param.stderr).contains("units"));
}

#[test]
fn effect_role_processes_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let config = dir.path().join("effect.toml");
    let out = dir.path().join("out.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&input, spec).unwrap();
    for i in 0..4800 {
        writer.write_sample(if i % 480 == 0 { 0.8f32 } else { 0.0 }).unwrap();
    }
    writer.finalize().unwrap();
    std::fs::write(&config, "role = \"effect\"\n").unwrap();

    let missing_input = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(!missing_input.status.success(), "effect role needs an input");

    let output = cymbalum_bin()
        .arg("render")
        .arg(&out)
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(&input)
        .args(["--tail", "0.1"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (_, samples) = read_wav(&out);
    assert_eq!(samples.len(), 4800 + 4800);
    assert!(samples.iter().any(|&x| x != 0.0), "input should excite the body");
}
