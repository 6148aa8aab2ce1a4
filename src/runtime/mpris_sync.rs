use crate::mpris::MprisHandle;
use crate::session::PlaybackSession;

pub fn update_mpris(mpris: &MprisHandle, session: &PlaybackSession) {
    let track = session.current_track();
    let index = track.map(|_| session.current_index);
    mpris.set_track_metadata(index, track.map(|t| t.as_ref()));
    mpris.set_playback(session.state());
}
