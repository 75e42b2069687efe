//! Integration tests for the cymbalum engine.
//!
//! Drives [`Engine`] the way a host does, block by block, and checks the
//! properties that only show up end to end: bit-identical output across
//! variants, seed determinism, note handling across blocks, bypass, state
//! persistence and the out-of-band table path.

use cymbalum_synth::{
    CpuFeatures, CrossfadeState, Engine, EngineError, EngineOptions, EngineVariant, Param,
    ParamUpdate, ParameterStore,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 256;

/// A note event for [`render`]: (block index, offset, is_note_on, id, pitch).
type Event = (usize, u32, bool, i32, i16);

/// Render `blocks` blocks, pushing `events` and `updates` at their block.
fn render(engine: &mut Engine, blocks: usize, events: &[Event], updates: &[ParamUpdate]) -> Vec<f32> {
    let mut output = Vec::with_capacity(blocks * BLOCK);
    let mut buffer = vec![0.0; BLOCK];
    for block in 0..blocks {
        if block == 0 {
            engine.update_parameters(updates);
        }
        for &(at, offset, on, id, pitch) in events {
            if at == block {
                engine.push_midi_note(on, offset, id, pitch, 0.0, 0.9);
            }
        }
        engine.set_parameters(Some(120.0));
        engine.process(&[], &mut [buffer.as_mut_slice()]);
        output.extend_from_slice(&buffer);
    }
    output
}

fn rich_updates() -> Vec<ParamUpdate> {
    let mut store = ParameterStore::new();
    store.set_plain(Param::Units, 13.0);
    store.set_plain(Param::Stack, 3.0);
    store.set_plain(Param::RandomAmount, 1.0);
    store.set_plain(Param::LfoDepth, 0.5);
    store.set_plain(Param::LfoBeats, 0.25);
    store.set_plain(Param::Seed, 1234.0);
    Param::ALL
        .iter()
        .filter_map(|&p| store.normalized(p).map(|n| ParamUpdate::new(p, n)))
        .collect()
}

fn phrase() -> Vec<Event> {
    vec![
        (0, 17, true, 1, 60),
        (2, 200, true, 2, 67),
        (4, 0, false, 2, 67),
        (5, 31, true, 3, 48),
        (7, 128, false, 1, 60),
    ]
}

#[test]
fn all_variants_render_identical_bits() {
    let updates = rich_updates();
    let events = phrase();

    for mode in 0..=4 {
        let mut updates = updates.clone();
        updates.push(ParamUpdate::new(Param::OscType, f64::from(mode) / 4.0));

        let reference = render(
            &mut Engine::build(EngineVariant::Scalar, SAMPLE_RATE),
            12,
            &events,
            &updates,
        );
        for variant in [EngineVariant::Wide4, EngineVariant::Wide8, EngineVariant::Wide16] {
            let output = render(
                &mut Engine::build(variant, SAMPLE_RATE),
                12,
                &events,
                &updates,
            );
            assert!(
                output == reference,
                "{variant} should match scalar in mode {mode}"
            );
        }
    }
}

#[test]
fn same_seed_is_deterministic() {
    let updates = rich_updates();
    let events = phrase();
    let a = render(&mut Engine::build(EngineVariant::Wide4, SAMPLE_RATE), 10, &events, &updates);
    let b = render(&mut Engine::build(EngineVariant::Wide4, SAMPLE_RATE), 10, &events, &updates);
    assert_eq!(a, b);
    assert!(a.iter().any(|&x| x != 0.0));
}

#[test]
fn different_seed_differs_after_trigger() {
    let events = [(0, 0, true, 1, 60)];
    let mut updates = rich_updates();
    let a = render(&mut Engine::build(EngineVariant::Wide4, SAMPLE_RATE), 4, &events, &updates);

    let seed = Param::Seed.descriptor().normalize(99.0);
    updates.push(ParamUpdate::new(Param::Seed, f64::from(seed)));
    let b = render(&mut Engine::build(EngineVariant::Wide4, SAMPLE_RATE), 4, &events, &updates);

    // The trigger is consumed at the start of the second block.
    let k = 2 * BLOCK;
    assert!(
        a[..k].iter().zip(&b[..k]).any(|(x, y)| x != y),
        "Different seeds should diverge within {k} samples"
    );
}

#[test]
fn output_is_finite_under_extreme_settings() {
    let mut store = ParameterStore::new();
    store.set_plain(Param::Units, 32.0);
    store.set_plain(Param::Stack, 8.0);
    store.set_plain(Param::Decay, 16.0);
    store.set_plain(Param::CombFeedback, 0.9999);
    store.set_plain(Param::BandpassQ, 50.0);
    store.set_plain(Param::Distance, 0.0);
    store.set_plain(Param::Gain, 2.0);
    store.set_plain(Param::OscType, 4.0);
    let updates: Vec<ParamUpdate> = Param::ALL
        .iter()
        .filter_map(|&p| store.normalized(p).map(|n| ParamUpdate::new(p, n)))
        .collect();

    let out = render(
        &mut Engine::build(EngineVariant::Wide8, SAMPLE_RATE),
        40,
        &[(0, 0, true, 1, 108), (1, 0, true, 2, 21)],
        &updates,
    );
    assert!(out.iter().all(|x| x.is_finite()), "Output should stay finite");
}

#[test]
fn notes_persist_across_blocks() {
    let mut engine = Engine::build(EngineVariant::Scalar, SAMPLE_RATE);
    render(&mut engine, 2, &[(0, 10, true, 1, 60), (1, 5, true, 2, 64)], &[]);
    assert_eq!(engine.notes().len(), 2);

    render(&mut engine, 1, &[(0, 0, false, 1, 60), (0, 0, false, 42, 70)], &[]);
    assert_eq!(engine.notes().len(), 1);
    assert_eq!(engine.notes().current().map(|n| n.id), Some(2));
}

#[test]
fn host_note_id_minus_one_uses_pitch() {
    let mut engine = Engine::build(EngineVariant::Scalar, SAMPLE_RATE);
    render(&mut engine, 1, &[(0, 0, true, -1, 64)], &[]);
    render(&mut engine, 1, &[(0, 0, false, -1, 64)], &[]);
    assert!(engine.notes().is_empty());
}

#[test]
fn bypass_ramps_and_recovers() {
    let mut engine = Engine::build(EngineVariant::Wide4, SAMPLE_RATE);
    engine.setup(SAMPLE_RATE).unwrap();
    render(&mut engine, 2, &[(0, 0, true, 1, 60)], &[]);

    engine.update_parameters(&[ParamUpdate::new(Param::Bypass, 1.0)]);
    let fade = render(&mut engine, 8, &[], &[]);
    assert_eq!(engine.crossfade_state(), CrossfadeState::Bypassed);
    assert!(fade[1920..].iter().all(|&x| x == 0.0));

    engine.update_parameters(&[ParamUpdate::new(Param::Bypass, 0.0)]);
    render(&mut engine, 8, &[(0, 0, true, 2, 72)], &[]);
    assert_eq!(engine.crossfade_state(), CrossfadeState::Active);
}

#[test]
fn state_survives_a_new_engine() {
    let mut engine = Engine::build(EngineVariant::Wide8, SAMPLE_RATE);
    engine.update_parameters(&rich_updates());
    let blob = engine.encode_state();

    let mut restored = Engine::build(EngineVariant::Scalar, SAMPLE_RATE);
    let summary = restored.decode_state(&blob);
    assert!(summary.is_exact());
    assert_eq!(restored.params(), engine.params());

    let events = phrase();
    let a = render(&mut engine, 6, &events, &[]);
    let b = render(&mut restored, 6, &events, &[]);
    assert_eq!(a, b, "Restored state should render identically");
}

#[test]
fn truncated_state_falls_back_to_defaults() {
    let mut engine = Engine::build(EngineVariant::Scalar, SAMPLE_RATE);
    let blob = vec![0u8; 8 * 3 + 5];
    let summary = engine.decode_state(&blob);
    assert_eq!(summary.read, 3);
    assert_eq!(summary.defaulted, cymbalum_synth::PARAM_COUNT - 3);
    assert_eq!(summary.ignored_bytes, 5);
    assert_eq!(engine.params().get(Param::Units), 4.0);
}

#[test]
fn table_commands_reach_the_audio_path() {
    let mut engine = Engine::build(EngineVariant::Wide4, SAMPLE_RATE);
    let commands = engine.table_commands();

    assert_eq!(
        commands.request("reverb"),
        Err(EngineError::UnknownCommand("reverb".into()))
    );

    engine.update_parameters(&[ParamUpdate::new(Param::LfoShape, 1.0)]);
    commands.request("lfo").unwrap();
    let params = engine.params().clone();
    let control = std::thread::spawn(move || commands.run_pending(&params));
    assert_eq!(control.join().unwrap(), 1);

    assert_eq!(engine.table_commands().load_lfo().shape(), 1.0);
    let out = render(&mut engine, 2, &[(0, 0, true, 1, 60)], &[]);
    assert!(out.iter().all(|x| x.is_finite()));
}

#[test]
fn construction_fails_without_a_supported_variant() {
    let options = EngineOptions {
        candidates: vec![EngineVariant::Wide16, EngineVariant::Wide8, EngineVariant::Wide4],
        sample_rate: SAMPLE_RATE,
    };
    assert_eq!(
        Engine::with_cpu(&options, &CpuFeatures::none()).err(),
        Some(EngineError::UnsupportedCpu)
    );

    let engine = Engine::new(EngineOptions::default()).unwrap();
    assert!(engine.variant().is_supported(&CpuFeatures::detect()));
}

#[test]
fn setup_rejects_invalid_rate_and_keeps_running() {
    let mut engine = Engine::build(EngineVariant::Scalar, SAMPLE_RATE);
    assert_eq!(
        engine.setup(f32::NAN).err().map(|e| e.to_string()),
        Some("invalid sample rate: NaN".to_string())
    );
    assert_eq!(engine.sample_rate(), SAMPLE_RATE);

    engine.setup(96000.0).unwrap();
    let out = render(&mut engine, 4, &[(0, 0, true, 1, 60)], &[]);
    assert!(out.iter().any(|&x| x != 0.0));
}

#[test]
fn reset_silences_and_releases() {
    let mut engine = Engine::build(EngineVariant::Wide8, SAMPLE_RATE);
    render(&mut engine, 2, &[(0, 0, true, 1, 60)], &[]);
    engine.reset();
    assert!(engine.notes().is_empty());
    let out = render(&mut engine, 2, &[], &[]);
    assert!(out.iter().all(|&x| x == 0.0));
}
