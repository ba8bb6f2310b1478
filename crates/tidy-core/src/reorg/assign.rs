use crate::model::{Link, Section};

/// Hand each link to the first section whose line range contains it.
///
/// Assigned links move into `section.links` (in document order) with
/// `link.section` set. Links outside every section are returned untouched;
/// they take no further part in relocation.
pub fn assign_links_to_sections(sections: &mut [Section], links: Vec<Link>) -> Vec<Link> {
    let mut unassigned = Vec::new();

    for mut link in links {
        match sections.iter_mut().find(|s| s.contains_line(link.line)) {
            Some(section) => {
                link.section = Some(section.title.clone());
                section.links.push(link);
            }
            None => unassigned.push(link),
        }
    }

    unassigned
}
