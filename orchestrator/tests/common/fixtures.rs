//! Test fixtures and data for orchestrator tests
//!
//! Parts are remote by default so runs need neither uploads nor real files.

use shared::{
    AudioSelection, GenerationMode, GenerationRequest, MediaKind, MediaPart, PartPool, SlotRole, VariantSettings,
};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const CDN: &'static str = "https://cdn.test";
    pub const TEST_SEED: u64 = 0x5eed;

    pub const HOOKS: [&'static str; 3] = ["A", "B", "C"];

    pub const VERSUS_SLOTS: [(&'static str, SlotRole); 8] = [
        ("Arrives Stadium", SlotRole::Free),
        ("Training", SlotRole::Free),
        ("Entry", SlotRole::Free),
        ("Lineup", SlotRole::Free),
        ("Face Cam", SlotRole::Free),
        ("Skills", SlotRole::PairLead),
        ("Goals", SlotRole::PairTail),
        ("Celebrations", SlotRole::Free),
    ];

    pub fn remote(id: &str) -> MediaPart {
        MediaPart::remote(id, MediaKind::Video, format!("{}/{id}.mp4", Self::CDN))
    }

    pub fn hooks() -> Vec<String> {
        Self::HOOKS.iter().map(|h| h.to_string()).collect()
    }

    pub fn request(mode: GenerationMode, pools: Vec<PartPool>, count: usize) -> GenerationRequest {
        GenerationRequest {
            mode,
            pools,
            hooks: Self::hooks(),
            audio: Some(AudioSelection::NoMusic),
            settings: VariantSettings::with_count(count),
        }
    }

    /// Versus layout from one id list per slot
    pub fn versus(slots: [&[&str]; 8], count: usize) -> GenerationRequest {
        let pools = Self::VERSUS_SLOTS
            .iter()
            .zip(slots.iter())
            .map(|((name, role), ids)| PartPool::new(*name, *role, ids.iter().map(|id| Self::remote(id)).collect()))
            .collect();
        Self::request(GenerationMode::Versus, pools, count)
    }

    /// arrivesStadium=[v1], skills=[s1,s2], goals=[g1], celebrations=[c1]
    pub fn scenario_a(count: usize) -> GenerationRequest {
        Self::versus([&["v1"], &[], &[], &[], &[], &["s1", "s2"], &["g1"], &["c1"]], count)
    }

    /// `pool_count` fixed-position pools of `size` parts each
    pub fn fixed_parts(mode: GenerationMode, pool_count: usize, size: usize, count: usize) -> GenerationRequest {
        let pools = (0..pool_count)
            .map(|p| {
                PartPool::new(
                    format!("Part {}", p + 1),
                    SlotRole::FixedPosition,
                    (0..size).map(|i| Self::remote(&format!("p{p}_{i}"))).collect(),
                )
            })
            .collect();
        Self::request(mode, pools, count)
    }

    /// Ten fixed pools with a space far larger than any request
    pub fn fein(count: usize) -> GenerationRequest {
        Self::fixed_parts(GenerationMode::Fein, 10, 2, count)
    }

    pub fn add_hook(videos: Vec<MediaPart>, count: usize) -> GenerationRequest {
        Self::request(GenerationMode::AddHook, vec![PartPool::new("Base", SlotRole::Free, videos)], count)
    }
}
