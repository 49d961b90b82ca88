//! Fixed prompt text and delimiters shared by both generation stages.
//!
//! Downstream parsing is tuned to these exact strings: the stage-one template
//! asks for a JSON object with a `spec` field, and the addendum asks for the
//! code to be fenced by [`CODE_REGION_CLOSER`].

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_TEMPERATURE: f32 = 0.75;

pub const HTML_DOCUMENT_MARKER: &str = "<!DOCTYPE html>";

pub const CODE_REGION_OPENER: &str = "```";

pub const CODE_REGION_CLOSER: &str = "```";

pub const SPEC_FROM_VIDEO_PROMPT: &str = r#"You are an instructional designer and product designer who builds playful, effective learning experiences as small interactive web apps.

Watch the attached video. Then write a detailed, carefully considered spec for an interactive web app that complements the video and reinforces its key idea or ideas. Whoever receives the spec will never see the video, so the spec must be complete on its own and must not mention that it was derived from a video.

An example of the expected style, written for a video about functional harmony:

"In music, chords create expectations of movement toward other chords and of resolution toward a tonal center. This is called functional harmony.

Build me an interactive web app that helps a learner understand functional harmony.

SPECIFICATIONS:
1. The app must feature an interactive keyboard.
2. The app must show the basic triads of the major key (I, ii, iii, IV, V, vi, vii°).
3. The app must explain the function of each chord (tonic, subdominant, dominant).
4. The app must let the learner build a progression and hear it played back.
5. The app must highlight when a progression resolves to the tonic."

Keep the app simple enough that a junior web developer could implement it in a single HTML file with inline styles and scripts. Above all, the spec must spell out the core mechanics of the app, and those mechanics must be highly effective at reinforcing the video's key idea(s).

Return the result as a JSON object with a single field named "spec" whose value is the spec for the web app."#;

pub const SPEC_ADDENDUM: &str = "\n\nThe app must be fully responsive and work well on both desktop and mobile. Provide the code as a single, self-contained HTML document with all styles and scripts inline. In the result, enclose the code between \"```\" and \"```\" so it can be parsed easily.";
