// Whole-graph runs on real media, local-only mode

mod common;

use std::sync::mpsc;
use std::time::Duration;

use gstreamer as gst;
use gstreamer::prelude::*;

use common::*;
use streammix_lib::error::PipelineError;
use streammix_lib::pipeline::resolver::Outcome;
use streammix_lib::pipeline::{MixGraph, RunOutcome};

const RUN_TIMEOUT: Duration = Duration::from_secs(60);

#[test]
fn three_clips_play_to_end_of_stream() {
    if !engine_ready(&[BASE_FACTORIES]) {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut sources = Vec::new();
    for i in 0..3 {
        let path = dir.path().join(format!("clip_{}.ogg", i));
        if encode_test_clip(&path).is_none() {
            return;
        }
        sources.push(path);
    }

    let graph = MixGraph::build(&spec(sources, None, headless_config())).unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = graph.run();
        let linked: Vec<_> = graph
            .resolver()
            .report()
            .into_iter()
            .filter(|record| matches!(record.outcome, Outcome::Linked(_)))
            .collect();
        let _ = tx.send((outcome, linked.len()));
    });

    let (outcome, linked) = rx.recv_timeout(RUN_TIMEOUT).expect("run did not finish");
    assert_eq!(outcome.unwrap(), RunOutcome::EndOfStream);
    // Three video streams, the authoritative audio and two discarded audio streams
    assert_eq!(linked, 6);
}

#[test]
fn unreadable_input_fails_the_run() {
    if !engine_ready(&[BASE_FACTORIES]) {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let sources: Vec<_> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("garbage_{}.mp4", i));
            std::fs::write(&path, vec![0x5au8; 4096]).unwrap();
            path
        })
        .collect();

    let graph = MixGraph::build(&spec(sources, None, headless_config())).unwrap();
    let pipeline = graph.pipeline().clone();

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let outcome = graph.run();
        drop(graph);
        let _ = tx.send(outcome);
    });

    let outcome = rx.recv_timeout(RUN_TIMEOUT).expect("run did not finish");
    assert!(
        matches!(
            outcome,
            Err(PipelineError::Engine { .. }) | Err(PipelineError::StateChange(_))
        ),
        "unexpected outcome {:?}",
        outcome
    );

    let (_, current, _) = pipeline.state(gst::ClockTime::from_seconds(5));
    assert_eq!(current, gst::State::Null);
}
