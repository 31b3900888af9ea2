mod ask;

pub(crate) use ask::ask;
