mod render_smoke {
    use lectern::{
        Canvas, Envelope, Fps, InMemorySink, Line, RenderOpts, RenderSession, Scene, Script,
        Speaker,
    };

    fn lecture_script() -> Script {
        Script {
            scenes: vec![
                Scene {
                    title: "Concept 1".to_string(),
                    keyline: "Supply aligns with expected demand".to_string(),
                    dialogue: vec![
                        Line {
                            speaker: Speaker::Teacher,
                            text: "Key idea 1: supply follows demand.".to_string(),
                        },
                        Line {
                            speaker: Speaker::Student,
                            text: "So if demand spikes later, we adjust prep and pricing?".to_string(),
                        },
                    ],
                },
                Scene {
                    title: "Concept 2".to_string(),
                    keyline: "Waste tracking optimizes inventory".to_string(),
                    dialogue: vec![Line {
                        speaker: Speaker::Teacher,
                        text: "Exactly. Tracking waste closes the loop.".to_string(),
                    }],
                },
            ],
        }
    }

    fn small_opts() -> RenderOpts {
        RenderOpts {
            fps: Fps::new(12, 1).unwrap(),
            canvas: Canvas::new(128, 72).unwrap(),
            ..RenderOpts::default()
        }
    }

    fn session(duration: f64, opts: RenderOpts) -> RenderSession {
        RenderSession::from_parts(lecture_script(), duration, None, opts).unwrap()
    }

    #[test]
    fn full_timeline_reaches_sink_in_order() {
        let session = session(2.5, small_opts());
        assert_eq!(session.total_frames(), 30);

        let mut sink = InMemorySink::new();
        let delivered = session.render_into(&mut sink, None).unwrap();
        assert_eq!(delivered, 30);
        assert_eq!(sink.frames().len(), 30);
        for (i, (idx, frame)) in sink.frames().iter().enumerate() {
            assert_eq!(idx.0, i as u64);
            assert_eq!(frame.width, 128);
            assert_eq!(frame.height, 72);
            assert_eq!(frame.data.len(), 128 * 72 * 4);
        }
        let cfg = sink.config().unwrap();
        assert_eq!((cfg.width, cfg.height), (128, 72));
        assert!(cfg.audio_path.is_none());
    }

    #[test]
    fn repeated_renders_are_byte_identical() {
        let session = session(1.0, small_opts());

        let mut a = InMemorySink::new();
        let mut b = InMemorySink::new();
        session.render_into(&mut a, None).unwrap();
        session.render_into(&mut b, None).unwrap();

        for ((ia, fa), (ib, fb)) in a.frames().iter().zip(b.frames()) {
            assert_eq!(ia, ib);
            assert_eq!(fa.data, fb.data, "frame {} differs between runs", ia.0);
        }
    }

    #[test]
    fn parallel_render_matches_sequential() {
        let seq_session = session(1.5, small_opts());
        let par_session = session(
            1.5,
            RenderOpts {
                parallel: true,
                threads: Some(4),
                chunk_size: 5,
                ..small_opts()
            },
        );

        let mut seq = InMemorySink::new();
        let mut par = InMemorySink::new();
        seq_session.render_into(&mut seq, None).unwrap();
        par_session.render_into(&mut par, None).unwrap();

        assert_eq!(seq.frames().len(), par.frames().len());
        for ((is, fs), (ip, fp)) in seq.frames().iter().zip(par.frames()) {
            assert_eq!(is, ip);
            assert_eq!(fs.data, fp.data, "frame {} differs from sequential", is.0);
        }
    }

    #[test]
    fn empty_script_renders_placeholder_timeline() {
        let session =
            RenderSession::from_parts(Script::default(), 1.0, None, small_opts()).unwrap();
        assert_eq!(session.utterances().len(), 1);
        assert_eq!(session.utterances()[0].text, "No dialog provided.");

        let mut sink = InMemorySink::new();
        let delivered = session.render_into(&mut sink, None).unwrap();
        assert_eq!(delivered, session.total_frames());
    }

    #[test]
    fn silent_envelope_renders_minimum_mouth_throughout() {
        // All-zero envelope (silent narration): frames still render, and the
        // timeline matches the declared duration.
        let frames = Fps::new(12, 1).unwrap().cover_secs(1.0);
        let env = Envelope::from_mono_samples(&vec![0.0f32; 12_000], frames);
        assert!(env.values().iter().all(|&v| v == 0.0));

        let session =
            RenderSession::from_parts(lecture_script(), 1.0, Some(env), small_opts()).unwrap();
        let mut sink = InMemorySink::new();
        session.render_into(&mut sink, None).unwrap();
        assert_eq!(sink.frames().len(), 12);

        // With a flat envelope the only motion left is the background and the
        // progress bar; consecutive frames still differ through those.
        assert_ne!(sink.frames()[0].1.data, sink.frames()[11].1.data);
    }
}
