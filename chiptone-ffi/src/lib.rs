//! C ABI wrapper for the Chiptone playback controller.
//!
//! The host owns the audio device: it creates a player at its device rate,
//! pulls interleaved f32 frames from the audio callback and drives sounds,
//! music, mute and volumes from its UI thread.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `ChiptonePlayer` (heap-allocated; free with `chiptone_destroy`).
//! - Render path produces **mono** internally and duplicates to N channels.
//!
//! Threading
//! - Render and control calls may come from different threads; the mixer
//!   they share is locked per call. Destroy only once both have stopped.

use std::ffi::{c_char, CStr};

use chiptone_engine::{ControllerConfig, PlaybackController, SharedMixer, ThreadNoise};

/// Opaque player handed to C.
pub struct ChiptonePlayer {
    controller: PlaybackController<SharedMixer>,
    mixer: SharedMixer,
}

impl ChiptonePlayer {
    fn new(sample_rate: u32) -> Option<Self> {
        let mixer = SharedMixer::new(sample_rate).ok()?;
        let controller =
            PlaybackController::with_shop_sounds(mixer.clone(), ControllerConfig::default(), &mut ThreadNoise::new())
                .ok()?;
        Some(Self { controller, mixer })
    }
}

/// # Safety
/// `player` must be null or a live pointer from `chiptone_create`.
unsafe fn player_mut<'a>(player: *mut ChiptonePlayer) -> Option<&'a mut ChiptonePlayer> {
    player.as_mut()
}

// --- Creation / destruction -------------------------------------------------------

/// Create a player with the shop sounds and theme built at `sample_rate`.
/// Returns null if the rate is zero.
#[no_mangle]
pub extern "C" fn chiptone_create(sample_rate: u32) -> *mut ChiptonePlayer {
    match ChiptonePlayer::new(sample_rate) {
        Some(p) => Box::into_raw(Box::new(p)),
        None => std::ptr::null_mut(),
    }
}

/// Destroy a player previously returned by `chiptone_create`. Null is ignored.
///
/// # Safety
/// `player` must be null or a pointer from `chiptone_create` not yet destroyed.
#[no_mangle]
pub unsafe extern "C" fn chiptone_destroy(player: *mut ChiptonePlayer) {
    if !player.is_null() {
        let p = Box::from_raw(player);
        p.mixer.lock().clear();
    }
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` frames of `channels` interleaved f32 samples.
///
/// Returns the number of frames rendered (0 on error).
///
/// # Safety
/// `player` must be a live handle; `out_interleaved` must point to at least
/// `frames * channels` writable floats.
#[no_mangle]
pub unsafe extern "C" fn chiptone_render_interleaved_f32(
    player: *mut ChiptonePlayer,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    let Some(p) = player_mut(player) else { return 0 };
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let len = frames as usize * channels as usize;
    let out = std::slice::from_raw_parts_mut(out_interleaved, len);
    p.mixer.render_interleaved(out, channels as usize);
    frames
}

// --- Playback control ------------------------------------------------------------

/// Fire a one-shot by name. Returns `false` if `name` is null, not UTF-8 or
/// not a known sound; a known sound is still silent while muted.
///
/// # Safety
/// `player` must be a live handle; `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn chiptone_play_sound(player: *mut ChiptonePlayer, name: *const c_char) -> bool {
    let Some(p) = player_mut(player) else { return false };
    if name.is_null() {
        return false;
    }
    let Ok(name) = CStr::from_ptr(name).to_str() else { return false };
    if p.controller.bank().get(name).is_none() {
        return false;
    }
    p.controller.play_one_shot(name);
    true
}

/// Start (or restart) the music loop.
///
/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_play_music(player: *mut ChiptonePlayer) {
    if let Some(p) = player_mut(player) {
        p.controller.play_music();
    }
}

/// Stop the music loop.
///
/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_stop_music(player: *mut ChiptonePlayer) {
    if let Some(p) = player_mut(player) {
        p.controller.stop_music();
    }
}

/// Flip the master mute and return the new state.
///
/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_toggle_mute(player: *mut ChiptonePlayer) -> bool {
    match player_mut(player) {
        Some(p) => p.controller.toggle_mute(),
        None => false,
    }
}

/// Set the music volume, clamped to [0, 1].
///
/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_set_music_volume(player: *mut ChiptonePlayer, volume: f32) {
    if let Some(p) = player_mut(player) {
        p.controller.set_music_volume(volume);
    }
}

/// Set the effects volume, clamped to [0, 1].
///
/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_set_sfx_volume(player: *mut ChiptonePlayer, volume: f32) {
    if let Some(p) = player_mut(player) {
        p.controller.set_sfx_volume(volume);
    }
}

/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_is_music_playing(player: *mut ChiptonePlayer) -> bool {
    player_mut(player).is_some_and(|p| p.controller.is_music_playing())
}

/// # Safety
/// `player` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chiptone_is_muted(player: *mut ChiptonePlayer) -> bool {
    player_mut(player).is_some_and(|p| p.controller.is_muted())
}
