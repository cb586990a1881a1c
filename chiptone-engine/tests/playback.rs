//! End-to-end playback through a pull-mode shared mixer: the controller
//! starts and stops sessions, the test plays the part of the audio callback.

use chiptone_core::wave::Silence;
use chiptone_engine::{BankFile, ControllerConfig, Generator, PlaybackController, SharedMixer};

const SR: u32 = 8_000;

fn shop_controller(mixer: &SharedMixer) -> PlaybackController<SharedMixer> {
    PlaybackController::with_shop_sounds(mixer.clone(), ControllerConfig::default(), &mut Silence).unwrap()
}

fn pull(mixer: &SharedMixer, n: usize) -> Vec<f32> {
    let mut out = vec![0.0; n];
    mixer.render(&mut out);
    out
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
}

#[test]
fn music_loop_plays_at_music_volume() {
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = shop_controller(&mixer);
    c.play_music();

    // one full four-second loop and a bit
    let out = pull(&mixer, 4 * SR as usize + 400);
    let p = peak(&out);
    assert!(p > 0.0);
    // built peak is 0.7, scaled by the 0.3 default music volume
    assert!(p <= 0.7 * 0.3 + 1e-6, "peak {p}");
    assert!(c.is_music_playing());
    assert_eq!(mixer.lock().active_count(), 1);
}

#[test]
fn one_shot_finishes_on_its_own() {
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = shop_controller(&mixer);
    c.play_one_shot("select");
    c.play_one_shot("navigate");
    assert_eq!(mixer.lock().active_count(), 2);

    // navigate is 0.05 s, select 0.1 s
    pull(&mixer, 400);
    assert_eq!(mixer.lock().active_count(), 1);
    pull(&mixer, 400);
    assert_eq!(mixer.lock().active_count(), 0);
    assert!(pull(&mixer, 16).iter().all(|&s| s == 0.0));
}

#[test]
fn one_shots_overlap_with_music() {
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = shop_controller(&mixer);
    c.play_music();
    c.play_one_shot("buy");
    c.play_one_shot("buy");
    assert_eq!(mixer.lock().active_count(), 3);
}

#[test]
fn mute_silences_output_and_unmute_resumes_music() {
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = shop_controller(&mixer);
    c.play_music();
    pull(&mixer, 200);

    assert!(c.toggle_mute());
    assert_eq!(mixer.lock().active_count(), 0);
    c.play_one_shot("confirm");
    assert!(pull(&mixer, 200).iter().all(|&s| s == 0.0));

    assert!(!c.toggle_mute());
    assert_eq!(mixer.lock().active_count(), 1);
    assert!(peak(&pull(&mixer, 400)) > 0.0);
}

#[test]
fn live_music_volume_reaches_the_mixer() {
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = shop_controller(&mixer);
    c.play_music();
    c.set_music_volume(0.0);
    assert!(pull(&mixer, 800).iter().all(|&s| s == 0.0));
    c.set_music_volume(1.0);
    assert!(peak(&pull(&mixer, 800)) > 0.2);
}

#[test]
fn bank_file_drives_the_controller() {
    let text = r#"{
        "sounds": [
            { "name": "zap", "type": "sawtooth", "frequency": 880, "duration": 0.05, "attack": 0.005 },
            { "name": "hiss", "waveform": "noise", "frequency": 1, "volume": 0.5 }
        ]
    }"#;
    let file = BankFile::from_json(text).unwrap();
    let mixer = SharedMixer::new(SR).unwrap();
    let mut c = PlaybackController::from_bank_file(mixer.clone(), &file, ControllerConfig::default(), &mut Silence)
        .unwrap();

    assert_eq!(c.sound_names().collect::<Vec<_>>(), ["hiss", "zap"]);
    c.play_music();
    assert!(!c.is_music_playing());
    c.play_one_shot("zap");
    assert_eq!(mixer.lock().active_count(), 1);
    assert_eq!(Generator::sample_rate(&*mixer.lock()), SR);
}
