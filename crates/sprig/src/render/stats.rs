use std::fmt;

/// Draw counters accumulated by the batch renderer.
///
/// They are never reset implicitly; call
/// [`QuadBatchRenderer::reset_stats`](super::QuadBatchRenderer::reset_stats)
/// once per frame if per-frame numbers are wanted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub quad_count: u32,
}

impl RenderStats {
    pub fn vertex_count(&self) -> u32 {
        self.quad_count * 4
    }

    pub fn index_count(&self) -> u32 {
        self.quad_count * 6
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw calls: {}, quads: {}, vertices: {}, indices: {}",
            self.draw_calls,
            self.quad_count,
            self.vertex_count(),
            self.index_count()
        )
    }
}
