//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

mod common;

#[cfg(test)]
mod passing {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use mhtml_view::{MhtmlOptions, Session};
    use tempfile::tempdir;

    use crate::common::{sample_archive, write_archive};

    const THREADS: usize = 8;

    #[test]
    fn concurrent_requests_for_one_archive_agree() {
        let dir = tempdir().unwrap();
        let path = write_archive(dir.path(), "page.mhtml", sample_archive().build().as_bytes());
        let session = Session::new(MhtmlOptions::default());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let session = session.clone();
                let barrier = barrier.clone();
                let path = path.clone();
                thread::spawn(move || {
                    barrier.wait();
                    session.resolve_archive(&path).unwrap()
                })
            })
            .collect();

        let documents: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for document in &documents[1..] {
            assert_eq!(document.content, documents[0].content);
        }
        assert_eq!(session.cache().len(), 4);
    }

    #[test]
    fn distinct_archives_parse_in_parallel() {
        let dir = tempdir().unwrap();
        let paths: Vec<String> = (0..THREADS)
            .map(|i| {
                write_archive(
                    dir.path(),
                    &format!("page-{i}.mhtml"),
                    sample_archive().build().as_bytes(),
                )
            })
            .collect();
        let session = Session::new(MhtmlOptions::default());

        thread::scope(|scope| {
            for path in &paths {
                let session = &session;
                scope.spawn(move || session.parse(path).unwrap());
            }
        });

        for (i, path) in paths.iter().enumerate() {
            assert!(session.cache_get(path).is_some());
            assert!(session
                .cache_get(&format!("page-{i}.mhtml@1-site.css"))
                .is_some());
        }
        assert_eq!(session.cache().len(), THREADS * 4);
    }

    #[test]
    fn clear_racing_with_parse_never_leaves_partial_archive() {
        let dir = tempdir().unwrap();
        let path = write_archive(dir.path(), "page.mhtml", sample_archive().build().as_bytes());
        let session = Session::new(MhtmlOptions::default());

        thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..20 {
                    session.parse(&path).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..20 {
                    session.cache_clear();
                    thread::yield_now();
                }
            });
        });

        // 提交是原子的：要么整个归档都在，要么都不在
        let len = session.cache().len();
        assert!(len == 0 || len == 4, "unexpected cache size {len}");
    }
}
