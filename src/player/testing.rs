use std::sync::{Arc, Mutex};

use url::Url;

use super::{MediaElement, MediaEvent, MediaListener, PlaybackBlocked};

#[derive(Debug, Default)]
struct Element {
    listener: Option<MediaListener>,
    loads: Vec<Url>,
    seeks: Vec<f64>,
    playing: bool,
    blocked: bool,
    current_time: f64,
    rate: f64,
    muted: bool,
    fullscreen: bool,
}

/// Scriptable [MediaElement]. Clones share one element, so a test keeps a
/// clone to drive events after handing the other to the player.
#[derive(Debug, Clone, Default)]
pub struct FakeMedia {
    element: Arc<Mutex<Element>>,
}

impl FakeMedia {
    /// Emits through the listener of the loaded resource.
    pub fn emit(&self, event: MediaEvent) {
        if let Some(listener) = self.listener() {
            listener.emit(event);
        }
    }

    pub fn metadata(&self, duration: f64) {
        self.emit(MediaEvent::LoadedMetadata { duration });
    }

    pub fn time_update(&self, current_time: f64) {
        self.element.lock().unwrap().current_time = current_time;
        self.emit(MediaEvent::TimeUpdate { current_time });
    }

    pub fn end(&self) {
        self.emit(MediaEvent::Ended);
    }

    pub fn block_play(&self, blocked: bool) {
        self.element.lock().unwrap().blocked = blocked;
    }

    pub fn listener(&self) -> Option<MediaListener> {
        self.element.lock().unwrap().listener.clone()
    }

    pub fn loads(&self) -> Vec<Url> {
        self.element.lock().unwrap().loads.clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.element.lock().unwrap().seeks.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.element.lock().unwrap().playing
    }

    pub fn rate(&self) -> f64 {
        self.element.lock().unwrap().rate
    }

    pub fn is_muted(&self) -> bool {
        self.element.lock().unwrap().muted
    }

    pub fn is_fullscreen(&self) -> bool {
        self.element.lock().unwrap().fullscreen
    }
}

impl MediaElement for FakeMedia {
    fn load(&mut self, url: &Url, listener: MediaListener) {
        let mut element = self.element.lock().unwrap();
        element.loads.push(url.clone());
        element.listener = Some(listener);
        element.playing = false;
        element.current_time = 0.0;
    }

    fn unload(&mut self) {
        let mut element = self.element.lock().unwrap();
        element.listener = None;
        element.playing = false;
    }

    fn play(&mut self) -> Result<(), PlaybackBlocked> {
        let mut element = self.element.lock().unwrap();
        if element.blocked {
            return Err(PlaybackBlocked {
                reason: "autoplay policy".to_string(),
            });
        }

        element.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.element.lock().unwrap().playing = false;
    }

    fn current_time(&self) -> f64 {
        self.element.lock().unwrap().current_time
    }

    fn seek(&mut self, seconds: f64) {
        let mut element = self.element.lock().unwrap();
        element.seeks.push(seconds);
        element.current_time = seconds;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.element.lock().unwrap().rate = rate;
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.lock().unwrap().muted = muted;
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.element.lock().unwrap().fullscreen = fullscreen;
    }
}
