use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory the bundled portraits ship in.
pub const DEMOS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos");

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Example {
    /// File name under `demos/`, also what clients send back as the portrait.
    pub name: &'static str,
    /// Route the UI loads the thumbnail from.
    pub image: &'static str,
    #[serde(skip)]
    pub content_type: &'static str,
    pub prompt: &'static str,
}

impl Example {
    pub fn path(&self) -> PathBuf {
        Path::new(DEMOS_DIR).join(self.name)
    }
}

pub const EXAMPLES: &[Example] = &[
    Example {
        name: "monalisa.png",
        image: "/demos/monalisa.png",
        content_type: "image/png",
        prompt: "A beautiful brunette pilot girl, beautiful, moody lighting, best quality, full body portrait, real picture, intricate details, depth of field, in a cold snowstorm, , Fujifilm XT3, outdoors, Beautiful lighting, RAW photo, 8k uhd, film grain, unreal engine 5, ray trace, detail skin, realistic.",
    },
    Example {
        name: "gustave.png",
        image: "/demos/gustave.png",
        content_type: "image/png",
        prompt: "close-up fantasy-inspired portrait of haute couture hauntingly handsome 19 year old Persian male fashion model looking directly into camera, warm brown eyes, roguish black hair, wearing black assassin robes and billowing black cape , background is desert at night, ethereal dreamy foggy, photoshoot by Alessio Albi , editorial Fashion Magazine photoshoot, fashion poses, . Kinfolk Magazine. Film Grain.",
    },
];

/// 只接受內建範例的名稱，避免任意讀取伺服器上的檔案
pub fn find(name: &str) -> Option<&'static Example> {
    let name = name.trim_start_matches("/demos/");
    EXAMPLES.iter().find(|ex| ex.name == name)
}
