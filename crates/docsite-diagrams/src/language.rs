//! Diagram kinds and output formats supported by Kroki.

/// Supported diagram kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    ActDiag,
    BlockDiag,
    Bpmn,
    Bytefield,
    C4PlantUml,
    Ditaa,
    Erd,
    Excalidraw,
    GraphViz,
    Mermaid,
    Nomnoml,
    NwDiag,
    PacketDiag,
    Pikchr,
    PlantUml,
    RackDiag,
    SeqDiag,
    Svgbob,
    Umlet,
    Vega,
    VegaLite,
    WaveDrom,
    Structurizr,
}

impl DiagramKind {
    /// Every supported kind, in registration order.
    pub const ALL: [Self; 23] = [
        Self::ActDiag,
        Self::BlockDiag,
        Self::Bpmn,
        Self::Bytefield,
        Self::C4PlantUml,
        Self::Ditaa,
        Self::Erd,
        Self::Excalidraw,
        Self::GraphViz,
        Self::Mermaid,
        Self::Nomnoml,
        Self::NwDiag,
        Self::PacketDiag,
        Self::Pikchr,
        Self::PlantUml,
        Self::RackDiag,
        Self::SeqDiag,
        Self::Svgbob,
        Self::Umlet,
        Self::Vega,
        Self::VegaLite,
        Self::WaveDrom,
        Self::Structurizr,
    ];

    /// Parse a kind from a code fence name.
    ///
    /// Accepts both `mermaid` and `kroki-mermaid`, and `dot` for `GraphViz`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.strip_prefix("kroki-").unwrap_or(s);
        if name == "dot" {
            return Some(Self::GraphViz);
        }
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Kroki endpoint name, also used in the cache digest.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ActDiag => "actdiag",
            Self::BlockDiag => "blockdiag",
            Self::Bpmn => "bpmn",
            Self::Bytefield => "bytefield",
            Self::C4PlantUml => "c4plantuml",
            Self::Ditaa => "ditaa",
            Self::Erd => "erd",
            Self::Excalidraw => "excalidraw",
            Self::GraphViz => "graphviz",
            Self::Mermaid => "mermaid",
            Self::Nomnoml => "nomnoml",
            Self::NwDiag => "nwdiag",
            Self::PacketDiag => "packetdiag",
            Self::Pikchr => "pikchr",
            Self::PlantUml => "plantuml",
            Self::RackDiag => "rackdiag",
            Self::SeqDiag => "seqdiag",
            Self::Svgbob => "svgbob",
            Self::Umlet => "umlet",
            Self::Vega => "vega",
            Self::VegaLite => "vegalite",
            Self::WaveDrom => "wavedrom",
            Self::Structurizr => "structurizr",
        }
    }
}

/// Output format for rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    #[default]
    Svg,
    Png,
    Jpeg,
    Pdf,
    Txt,
    Base64,
}

impl DiagramFormat {
    /// Parse format from attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    /// Format name, used as the file extension.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Base64 => "base64",
        }
    }

    /// `Accept` header requesting this format from Kroki.
    #[must_use]
    pub fn accept(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Txt | Self::Base64 => "text/plain",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_all_kinds_round_trip_names() {
        for kind in DiagramKind::ALL {
            assert_eq!(DiagramKind::parse(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_parse_kroki_prefix() {
        assert_eq!(DiagramKind::parse("kroki-mermaid"), Some(DiagramKind::Mermaid));
        assert_eq!(DiagramKind::parse("kroki-bpmn"), Some(DiagramKind::Bpmn));
    }

    #[test]
    fn test_parse_dot_alias() {
        assert_eq!(DiagramKind::parse("dot"), Some(DiagramKind::GraphViz));
        assert_eq!(DiagramKind::parse("kroki-dot"), Some(DiagramKind::GraphViz));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(DiagramKind::parse("rust"), None);
        assert_eq!(DiagramKind::parse("Mermaid"), None);
        assert_eq!(DiagramKind::parse(""), None);
        assert_eq!(DiagramKind::parse("kroki-"), None);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(DiagramFormat::parse("svg"), Some(DiagramFormat::Svg));
        assert_eq!(DiagramFormat::parse("base64"), Some(DiagramFormat::Base64));
        assert_eq!(DiagramFormat::parse("gif"), None);
        assert_eq!(DiagramFormat::default(), DiagramFormat::Svg);
    }

    #[test]
    fn test_format_accept_headers() {
        assert_eq!(DiagramFormat::Svg.accept(), "image/svg+xml");
        assert_eq!(DiagramFormat::Png.accept(), "image/png");
        assert_eq!(DiagramFormat::Jpeg.accept(), "image/jpeg");
        assert_eq!(DiagramFormat::Pdf.accept(), "application/pdf");
        assert_eq!(DiagramFormat::Txt.accept(), "text/plain");
        assert_eq!(DiagramFormat::Base64.accept(), "text/plain");
    }
}
