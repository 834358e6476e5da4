use super::*;

#[tokio::test]
async fn immediate_frames_advance_by_step() {
    let syncer = ImmediateFrameSyncer::new(Duration::from_millis(10));
    let a = syncer.next_frame().await;
    let b = syncer.next_frame().await;
    assert_eq!(b - a, Duration::from_millis(10));
}

#[tokio::test]
async fn timer_frames_are_monotonic() {
    let syncer = TimerFrameSyncer::new(Duration::from_millis(2));
    let a = syncer.next_frame().await;
    let b = syncer.next_frame().await;
    assert!(b > a);
    assert_eq!(syncer.interval(), Duration::from_millis(2));
}

#[tokio::test]
async fn waits_in_the_same_tick_share_a_frame() {
    let syncer = TimerFrameSyncer::new(Duration::from_millis(20));
    syncer.next_frame().await;
    let (a, b) = futures::future::join(syncer.next_frame(), syncer.next_frame()).await;
    assert_eq!(a, b);
}
