mod support;

use fdt_raw::{FdtError, ROOT};
use support::blank;

#[test]
fn apply_by_target_phandle_merges_overlay_properties() {
    let mut base = blank(512);
    let mut overlay = blank(512);

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let soc = base_fdt.add_subnode(ROOT, "soc").unwrap();
        base_fdt.set_property(soc, "phandle", &5u32.to_be_bytes()).unwrap();
    }
    {
        let mut ov = overlay.as_fdt().unwrap();
        let frag = ov.add_subnode(ROOT, "fragment@0").unwrap();
        ov.set_property(frag, "target", &5u32.to_be_bytes()).unwrap();
        let ov_node = ov.add_subnode(frag, "__overlay__").unwrap();
        ov.set_property(ov_node, "status", b"okay\0").unwrap();
    }

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let mut ov_fdt = overlay.as_fdt().unwrap();
        fdt_overlay::apply(&mut base_fdt, &mut ov_fdt).unwrap();
    }

    let base_fdt = base.as_fdt().unwrap();
    let soc = base_fdt.path_offset("/soc").unwrap();
    assert_eq!(base_fdt.get_property(soc, "status").unwrap().unwrap().1, b"okay\0");
    drop(base_fdt);

    // The overlay is always damaged after apply(), win or lose.
    assert!(matches!(overlay.as_fdt(), Err(FdtError::BadMagic)));
}

#[test]
fn apply_by_target_path_and_adds_new_child() {
    let mut base = blank(512);
    let mut overlay = blank(512);

    {
        let mut base_fdt = base.as_fdt().unwrap();
        base_fdt.add_subnode(ROOT, "soc").unwrap();
    }
    {
        let mut ov = overlay.as_fdt().unwrap();
        let frag = ov.add_subnode(ROOT, "fragment@0").unwrap();
        ov.set_property(frag, "target-path", b"/soc\0").unwrap();
        let ov_node = ov.add_subnode(frag, "__overlay__").unwrap();
        let child = ov.add_subnode(ov_node, "uart@0").unwrap();
        ov.set_property(child, "compatible", b"acme,uart\0").unwrap();
    }

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let mut ov_fdt = overlay.as_fdt().unwrap();
        fdt_overlay::apply(&mut base_fdt, &mut ov_fdt).unwrap();
    }

    let base_fdt = base.as_fdt().unwrap();
    let uart = base_fdt.path_offset("/soc/uart@0").unwrap();
    assert_eq!(base_fdt.get_property(uart, "compatible").unwrap().unwrap().1, b"acme,uart\0");
}

#[test]
fn apply_resolves_external_fixup_through_symbols() {
    let mut base = blank(512);
    let mut overlay = blank(512);

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let soc = base_fdt.add_subnode(ROOT, "soc").unwrap();
        base_fdt.set_property(soc, "phandle", &7u32.to_be_bytes()).unwrap();
        let symbols = base_fdt.add_subnode(ROOT, "__symbols__").unwrap();
        base_fdt.set_property(symbols, "soc", b"/soc\0").unwrap();
    }
    {
        let mut ov = overlay.as_fdt().unwrap();
        let frag = ov.add_subnode(ROOT, "fragment@0").unwrap();
        ov.set_property(frag, "target-path", b"/\0").unwrap();
        let ov_node = ov.add_subnode(frag, "__overlay__").unwrap();
        let consumer = ov.add_subnode(ov_node, "consumer").unwrap();
        ov.set_property(consumer, "phandle-ref", &0xffff_ffffu32.to_be_bytes()).unwrap();

        let fixups = ov.add_subnode(ROOT, "__fixups__").unwrap();
        ov.set_property(fixups, "soc", b"/fragment@0/__overlay__/consumer:phandle-ref:0\0").unwrap();
    }

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let mut ov_fdt = overlay.as_fdt().unwrap();
        fdt_overlay::apply(&mut base_fdt, &mut ov_fdt).unwrap();
    }

    let base_fdt = base.as_fdt().unwrap();
    let consumer = base_fdt.path_offset("/consumer").unwrap();
    assert_eq!(
        base_fdt.get_property(consumer, "phandle-ref").unwrap().unwrap().1,
        &7u32.to_be_bytes()
    );
}

#[test]
fn merge_renumbers_fragments_and_dissolves_resolvable_ones() {
    let mut first = blank(512);
    let mut second = blank(512);

    {
        // first's own fragment@0 is never touched by merge(): it just sits
        // in the tree as ordinary content, and only counts toward the
        // renumbering delta applied to second's fragments.
        let mut f = first.as_fdt().unwrap();
        let frag = f.add_subnode(ROOT, "fragment@0").unwrap();
        f.set_property(frag, "target-path", b"/\0").unwrap();
        let ov = f.add_subnode(frag, "__overlay__").unwrap();
        f.set_property(ov, "marker", b"first\0").unwrap();
    }
    {
        // second's fragment@0 resolves to first's root, so apply_fragments
        // dissolves its __overlay__ contents directly onto that node rather
        // than leaving a /fragment@N/__overlay__ path behind.
        let mut s = second.as_fdt().unwrap();
        let frag = s.add_subnode(ROOT, "fragment@0").unwrap();
        s.set_property(frag, "target-path", b"/\0").unwrap();
        let ov = s.add_subnode(frag, "__overlay__").unwrap();
        s.set_property(ov, "marker2", b"second\0").unwrap();
    }

    {
        let mut f = first.as_fdt().unwrap();
        let mut s = second.as_fdt().unwrap();
        fdt_overlay::merge(&mut f, &mut s).unwrap();
    }

    let f = first.as_fdt().unwrap();
    // first's own fragment@0 survives untouched.
    assert_eq!(
        f.get_property(f.path_offset("/fragment@0/__overlay__").unwrap(), "marker").unwrap().unwrap().1,
        b"first\0"
    );
    // second's (renamed to fragment@1, then immediately dissolved) marker2
    // lands directly on the root it targeted.
    assert_eq!(f.get_property(ROOT, "marker2").unwrap().unwrap().1, b"second\0");
    drop(f);

    // second is always damaged after merge(); first is left usable on success.
    assert!(matches!(second.as_fdt(), Err(FdtError::BadMagic)));
    assert!(first.as_fdt().is_ok());
}

#[test]
fn merge_copies_fragment_verbatim_when_target_not_yet_present() {
    let mut first = blank(512);
    let mut second = blank(512);

    {
        let mut s = second.as_fdt().unwrap();
        let frag = s.add_subnode(ROOT, "fragment@0").unwrap();
        // A well-formed, non-sentinel phandle that just isn't declared
        // anywhere in `first` yet — a later overlay in the chain would
        // supply it. Not the 0xFFFFFFFF placeholder, which is a hard
        // BadPhandle error rather than a verbatim-copy case.
        s.set_property(frag, "target", &99u32.to_be_bytes()).unwrap();
        let ov = s.add_subnode(frag, "__overlay__").unwrap();
        s.set_property(ov, "only-in-verbatim", b"yes\0").unwrap();
    }

    {
        let mut f = first.as_fdt().unwrap();
        let mut s = second.as_fdt().unwrap();
        fdt_overlay::merge(&mut f, &mut s).unwrap();
    }

    let f = first.as_fdt().unwrap();
    // first had no fragments of its own, so second's fragment@0 stays fragment@0.
    let frag = f.path_offset("/fragment@0").unwrap();
    assert_eq!(f.get_property(frag, "target").unwrap().unwrap().1, &99u32.to_be_bytes());
    let ov = f.path_offset("/fragment@0/__overlay__").unwrap();
    assert_eq!(f.get_property(ov, "only-in-verbatim").unwrap().unwrap().1, b"yes\0");
}

#[test]
fn apply_propagates_symbols_into_base() {
    let mut base = blank(512);
    let mut overlay = blank(512);

    {
        let mut ov = overlay.as_fdt().unwrap();
        let frag = ov.add_subnode(ROOT, "fragment@0").unwrap();
        ov.set_property(frag, "target-path", b"/\0").unwrap();
        let ov_node = ov.add_subnode(frag, "__overlay__").unwrap();
        ov.add_subnode(ov_node, "foo@0").unwrap();

        let symbols = ov.add_subnode(ROOT, "__symbols__").unwrap();
        ov.set_property(symbols, "foo", b"/fragment@0/__overlay__/foo@0\0").unwrap();
    }

    {
        let mut base_fdt = base.as_fdt().unwrap();
        let mut ov_fdt = overlay.as_fdt().unwrap();
        fdt_overlay::apply(&mut base_fdt, &mut ov_fdt).unwrap();
    }

    let base_fdt = base.as_fdt().unwrap();
    let symbols = base_fdt.path_offset("/__symbols__").unwrap();
    assert_eq!(base_fdt.get_property(symbols, "foo").unwrap().unwrap().1, b"/foo@0\0");
}
